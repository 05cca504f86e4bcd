use chrono::{DateTime, Local};

/// One entry of the ordered rule table. `matches` sees a trimmed,
/// lowercased copy of the input; `respond` sees the original text so
/// templated replies can quote it verbatim.
struct Rule {
    matches: fn(&str) -> bool,
    respond: fn(&str) -> String,
}

const GREETING_TOKENS: &[&str] = &["halo", "hai", "hi", "hello", "selamat"];

fn contains_any(normalized: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| normalized.contains(needle))
}

/// Ordered top-to-bottom; first match wins. Order matters because the
/// keyword sets overlap ("help me with my feature request" must hit the
/// help rule, not the feature rule).
static RULES: &[Rule] = &[
    Rule {
        matches: |m| GREETING_TOKENS.iter().any(|t| m.starts_with(t)),
        respond: |_| {
            "Halo! 👋 Selamat datang di AI Chatbot. Ada yang bisa saya bantu?".to_string()
        },
    },
    Rule {
        matches: |m| contains_any(m, &["how are you", "kabar"]),
        respond: |_| {
            "Saya baik-baik saja, terima kasih sudah bertanya! Bagaimana dengan Anda?".to_string()
        },
    },
    Rule {
        matches: |m| contains_any(m, &["help", "bantuan", "cara"]),
        respond: |_| {
            "Cukup ketik pesan Anda di kolom bawah lalu tekan Kirim. Saya akan membalas \
             sebisa saya, dan tombol Clear menghapus riwayat obrolan."
                .to_string()
        },
    },
    Rule {
        matches: |m| contains_any(m, &["fitur", "feature"]),
        respond: |_| {
            "Fitur saya: mengobrol santai, menjawab pertanyaan sederhana, dan memberi tahu \
             tanggal serta jam saat ini. Dengan API key terpasang, jawaban datang dari model \
             AI sungguhan."
                .to_string()
        },
    },
    Rule {
        matches: |m| contains_any(m, &["thank you", "makasih", "terima kasih"]),
        respond: |_| "Sama-sama! Senang bisa membantu. 😊".to_string(),
    },
    Rule {
        matches: |m| contains_any(m, &["bye", "goodbye", "dadah"]),
        respond: |_| "Sampai jumpa! Terima kasih sudah mengobrol. 👋".to_string(),
    },
    Rule {
        matches: |m| contains_any(m, &["your name", "namamu"]),
        respond: |_| {
            "Saya asisten chatbot demo. Belum punya nama resmi, tapi senang berkenalan!"
                .to_string()
        },
    },
    Rule {
        // The one impure rule: answers with the wall clock at call time.
        matches: |m| contains_any(m, &["jam berapa", "waktu", "tanggal"]),
        respond: |_| time_reply(Local::now()),
    },
];

/// Deterministic canned responder used when no API key is configured or the
/// remote call degrades. Total: every input produces exactly one rule's
/// output, with the demo-mode echo as the unconditional last resort.
pub fn respond(message: &str) -> String {
    let normalized = message.trim().to_lowercase();
    for rule in RULES {
        if (rule.matches)(&normalized) {
            return (rule.respond)(message);
        }
    }
    demo_echo(message)
}

fn time_reply(now: DateTime<Local>) -> String {
    format!(
        "Sekarang tanggal {} pukul {}.",
        now.format("%d %B %Y"),
        now.format("%H:%M")
    )
}

fn demo_echo(message: &str) -> String {
    format!(
        "(Mode demo) Saya menerima pesan Anda: \"{}\". Pasang OPENAI_API_KEY di file .env \
         untuk mendapatkan jawaban dari model AI sungguhan.",
        message.trim()
    )
}
