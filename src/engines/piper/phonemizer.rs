use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::model::PiperError;

/// Location of the espeak-ng binary and its data directory.
///
/// `None` means "use the system default" for either path.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn command(&self) -> Command {
        let bin = self
            .bin_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("espeak-ng"));
        let mut cmd = Command::new(bin);
        if let Some(data) = &self.data_path {
            cmd.arg(format!("--path={}", data.display()));
        }
        cmd
    }
}

/// Convert text into one IPA phoneme string per sentence via espeak-ng.
///
/// Punctuation is carried over into the phoneme string so the voice can
/// pause on it; sentences end at `.`, `!` and `?` (Arabic marks included).
pub fn phonemize(
    text: &str,
    voice: &str,
    espeak: &EspeakConfig,
) -> Result<Vec<String>, PiperError> {
    let normalized = normalize_punctuation(text);
    let parts = split_text_parts(&normalized);
    if parts.is_empty() {
        return Ok(Vec::new());
    }

    let text_segments: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            TextPart::Text(segment) => Some(segment.as_str()),
            TextPart::Punct(_) => None,
        })
        .collect();

    let segment_ipa = if text_segments.is_empty() {
        Vec::new()
    } else {
        phonemize_segments_batch(&text_segments, voice, espeak)?
    };

    Ok(assemble_sentences(&parts, &segment_ipa))
}

/// Map Arabic punctuation to the ASCII marks voice phoneme maps know about
/// and drop the tatweel (kashida) stretching character.
fn normalize_punctuation(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|ch| matches!(ch, '\u{060C}' | '\u{061B}' | '\u{061F}' | '\u{0640}' | '\u{06D4}'))
    {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .filter(|&ch| ch != '\u{0640}')
            .map(|ch| match ch {
                '\u{060C}' => ',',
                '\u{061B}' => ';',
                '\u{061F}' => '?',
                '\u{06D4}' => '.',
                other => other,
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextPart {
    Text(String),
    Punct(char),
}

fn split_text_parts(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for (idx, ch) in text.char_indices() {
        let ch_len = ch.len_utf8();
        if let Some(punct) = map_boundary_punctuation(ch) {
            if !is_numeric_connector_between_digits(text, idx, ch_len, ch) {
                flush_text_part(&mut parts, &mut current);
                parts.push(TextPart::Punct(punct));
                continue;
            }
        }

        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(ch);
    }

    flush_text_part(&mut parts, &mut current);
    parts
}

fn flush_text_part(parts: &mut Vec<TextPart>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(TextPart::Text(trimmed.to_string()));
    }
    current.clear();
}

fn map_boundary_punctuation(ch: char) -> Option<char> {
    match ch {
        '.' | '!' | '?' | ',' | ';' | ':' => Some(ch),
        '\n' | '\r' => Some('.'),
        _ => None,
    }
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn is_numeric_connector_between_digits(text: &str, idx: usize, ch_len: usize, ch: char) -> bool {
    if !matches!(ch, '.' | ',') {
        return false;
    }

    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch_len..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if left.is_numeric() && right.is_numeric()
    )
}

/// Stitch phonemized text segments and punctuation back into sentences.
fn assemble_sentences(parts: &[TextPart], segment_ipa: &[String]) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut segment_index = 0usize;

    for part in parts {
        match part {
            TextPart::Text(_) => {
                if let Some(ipa) = segment_ipa.get(segment_index) {
                    let ipa = ipa.trim();
                    if !ipa.is_empty() {
                        if !current.is_empty() && !current.ends_with(' ') {
                            current.push(' ');
                        }
                        current.push_str(ipa);
                    }
                }
                segment_index += 1;
            }
            TextPart::Punct(ch) => {
                // A sentence that is only punctuation has nothing to say.
                if current.is_empty() {
                    continue;
                }
                current.push(*ch);
                if is_sentence_end(*ch) {
                    sentences.push(std::mem::take(&mut current));
                } else {
                    current.push(' ');
                }
            }
        }
    }

    let rest = current.trim_end();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn phonemize_segments_batch(
    segments: &[&str],
    voice: &str,
    espeak: &EspeakConfig,
) -> Result<Vec<String>, PiperError> {
    let batched_input = segments.join("\n");
    let output = run_espeak(&batched_input, voice, espeak)?;
    let lines: Vec<&str> = output.lines().collect();

    // One output line per input line in stdin mode; otherwise go one by one.
    if lines.len() != segments.len() {
        log::debug!(
            "espeak-ng returned {} lines for {} segments, phonemizing individually",
            lines.len(),
            segments.len()
        );
        return segments
            .iter()
            .map(|segment| Ok(clean_ipa(&run_espeak(segment, voice, espeak)?)))
            .collect();
    }

    Ok(lines.iter().map(|line| clean_ipa(line)).collect())
}

/// Join espeak-ng output lines and drop its word-separator marks.
fn clean_ipa(ipa: &str) -> String {
    ipa.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|&ch| ch != '_')
        .collect()
}

fn run_espeak(input: &str, voice: &str, espeak: &EspeakConfig) -> Result<String, PiperError> {
    let mut child = espeak
        .command()
        .args(["--ipa", "--stdin", "-q", "-v", voice])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PiperError::EspeakNotFound
            } else {
                PiperError::Io(e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // espeak-ng under-processes a final line without a terminator.
        let stdin_payload = canonicalize_espeak_stdin_payload(input);
        stdin
            .write_all(stdin_payload.as_bytes())
            .map_err(PiperError::Io)?;
    }

    let output = child.wait_with_output().map_err(PiperError::Io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PiperError::PhonemizerFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn canonicalize_espeak_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}
