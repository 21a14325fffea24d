pub mod remote;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::{Backend, Config};
use crate::error::BotError;

pub use remote::RemoteTransliterator;

/// Turns (already lowercased) Finglish text into Farsi script.
#[async_trait]
pub trait Transliterator: Send + Sync {
    async fn transliterate(&self, text: &str) -> Result<String, BotError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Table-driven backend; needs no network and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransliterator;

#[async_trait]
impl Transliterator for LocalTransliterator {
    async fn transliterate(&self, text: &str) -> Result<String, BotError> {
        Ok(transliterate(text))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Build the backend selected in `[transliteration]`.
pub fn build_transliterator(config: &Config) -> Result<Arc<dyn Transliterator>> {
    let backend: Arc<dyn Transliterator> = match config.transliteration.backend {
        Backend::Local => Arc::new(LocalTransliterator),
        Backend::Remote => Arc::new(RemoteTransliterator::new(
            config.transliteration.remote_url.clone(),
            config.http.timeout(),
        )?),
    };
    info!("Transliteration backend: {}", backend.name());
    Ok(backend)
}

/// Transliterate Finglish to Farsi with the fixed phonetic table.
///
/// Scans left to right. `c`, `g`, `k` and `s` followed by `h` form a digraph
/// that maps to one glyph and consumes both letters. `e` is silent. Anything
/// outside the lowercase table, Farsi glyphs included, is copied through, so
/// running the output through again changes nothing.
pub fn transliterate(finglish: &str) -> String {
    // Every Farsi glyph is two bytes in UTF-8.
    let mut farsi = String::with_capacity(finglish.len() * 2);
    let mut chars = finglish.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(glyph) = digraph(c) {
            if chars.next_if_eq(&'h').is_some() {
                farsi.push(glyph);
                continue;
            }
        }

        match c {
            'e' => {}
            _ => farsi.push(letter(c).unwrap_or(c)),
        }
    }

    farsi
}

/// Glyph for `<c>h`, when `c` can start a digraph.
fn digraph(c: char) -> Option<char> {
    match c {
        'c' => Some('چ'),
        'g' => Some('غ'),
        'k' => Some('خ'),
        's' => Some('ش'),
        _ => None,
    }
}

fn letter(c: char) -> Option<char> {
    let glyph = match c {
        'a' => 'ا',
        'b' => 'ب',
        'c' => 'س',
        'd' => 'د',
        'f' => 'ف',
        'g' => 'گ',
        'h' => 'ه',
        'i' => 'ی',
        'j' => 'ج',
        'k' => 'ک',
        'l' => 'ل',
        'm' => 'م',
        'n' => 'ن',
        'o' => 'و',
        'p' => 'پ',
        'q' => 'ک',
        'r' => 'ر',
        's' => 'س',
        't' => 'ت',
        'u' => 'و',
        'v' => 'و',
        'w' => 'و',
        'x' => 'خ',
        'y' => 'ی',
        'z' => 'ز',
        _ => return None,
    };
    Some(glyph)
}
