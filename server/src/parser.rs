//! Befehlsparser fuer die Daemon-Konsole (ServerQuery-Stil)
//!
//! Parst zeilenbasierte Befehle im Format:
//!   befehl [argument ...] key1=value1 key2="value with spaces"
//!
//! Sonderzeichen in Werten werden mit Backslash escaped:
//!   \s = Leerzeichen, \n = Newline, \\ = Backslash, \| = Pipe

use std::collections::HashMap;

use crate::error::{DaemonError, DaemonResult};

/// Eine geparste Konsolenzeile
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// Befehlsname (z.B. "headset", "route")
    pub name: String,
    /// Positionsargumente ohne '=' (z.B. "plug")
    pub args: Vec<String>,
    /// Key-Value-Parameter
    pub params: HashMap<String, String>,
}

impl ParsedCommand {
    /// Erstes Positionsargument, kleingeschrieben
    pub fn unterbefehl(&self) -> Option<String> {
        self.args.first().map(|s| s.to_lowercase())
    }

    /// Gibt einen Parameter als String zurueck
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    /// Gibt einen Pflicht-Parameter zurueck oder einen Fehler
    pub fn required_param(&self, key: &str) -> DaemonResult<&str> {
        self.param(key).ok_or_else(|| {
            DaemonError::UngueltigeEingabe(format!("Pflicht-Parameter fehlt: {key}"))
        })
    }

    /// Gibt einen Parameter als bool zurueck, fehlend = false
    pub fn bool_param(&self, key: &str) -> DaemonResult<bool> {
        match self.param(key) {
            None => Ok(false),
            Some(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "ja" => Ok(true),
                "false" | "0" | "nein" => Ok(false),
                _ => Err(DaemonError::UngueltigeEingabe(format!(
                    "Ungueltiger Wahrheitswert fuer '{key}': {s}"
                ))),
            },
        }
    }
}

/// Parst eine Befehlszeile
///
/// Werte koennen mit " " gequotet oder mit \s escaped sein.
pub fn parse_line(line: &str) -> DaemonResult<ParsedCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DaemonError::Protokoll("Leere Befehlszeile".into()));
    }

    let tokens = tokenize(line);
    let Some((erstes, rest)) = tokens.split_first() else {
        return Err(DaemonError::Protokoll("Kein Befehlsname".into()));
    };

    let name = erstes.to_lowercase();
    let mut args = Vec::new();
    let mut params = HashMap::new();

    for token in rest {
        match token.split_once('=') {
            Some((key, value)) => {
                params.insert(key.to_lowercase(), decode_value(value));
            }
            None => args.push(token.clone()),
        }
    }

    Ok(ParsedCommand { name, args, params })
}

/// Zerlegt eine Zeile in Tokens, beachtet quoted Strings
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            // Escapes bleiben fuer decode_value erhalten
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Dekodiert Escape-Sequenzen in einem Wert-String
fn decode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('s') => result.push(' '),
                Some('n') => result.push('\n'),
                Some('\\') => result.push('\\'),
                Some('|') => result.push('|'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Kodiert einen Wert fuer die Ausgabe (Escape-Sequenzen einfuegen)
pub fn encode_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(' ', "\\s")
        .replace('\n', "\\n")
        .replace('|', "\\|")
}

/// Erstellt eine Erfolgs-Antwortzeile
pub fn ok_antwort(params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        "ok\n".to_string()
    } else {
        let kv: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_value(v)))
            .collect();
        format!("ok {}\n", kv.join(" "))
    }
}

/// Erstellt eine Fehler-Antwortzeile
pub fn fehler_antwort(code: u32, nachricht: &str) -> String {
    format!("error id={} msg={}\n", code, encode_value(nachricht))
}
