use std::io::{self, IsTerminal, Write};

use console::{Key, Term};

use crate::settings::Prompter;

/// Anything that yields raw key presses.
pub trait KeySource {
    fn read_key(&mut self) -> io::Result<Key>;
}

impl KeySource for Term {
    fn read_key(&mut self) -> io::Result<Key> {
        Term::read_key(self)
    }
}

/// Writes `"{prefix}: "` and calls `read` until it returns something
/// that is not blank.
pub fn read_until_not_blank<W, F>(prefix: &str, out: &mut W, mut read: F) -> io::Result<String>
where
    W: Write,
    F: FnMut() -> io::Result<String>,
{
    loop {
        write!(out, "{prefix}: ")?;
        out.flush()?;
        let value = read()?;
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
}

/// Reads one line of secret input, echoing `*` for every character.
/// Backspace erases the last character and its mask, Enter ends the line
/// whatever it holds. Keys without a character (arrows, Escape) are ignored.
pub fn read_masked<K, W>(keys: &mut K, out: &mut W) -> io::Result<String>
where
    K: KeySource,
    W: Write,
{
    let mut secret = String::new();
    loop {
        match keys.read_key()? {
            Key::Enter => {
                writeln!(out)?;
                out.flush()?;
                return Ok(secret);
            }
            Key::Backspace => {
                if secret.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                }
            }
            Key::Tab => {
                secret.push('\t');
                write!(out, "*")?;
            }
            Key::Char(c) => {
                secret.push(c);
                write!(out, "*")?;
            }
            Key::CtrlC => {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "password entry cancelled",
                ));
            }
            // console yields Unknown for every read once no terminal is attached.
            Key::Unknown => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "terminal closed during password entry",
                ));
            }
            _ => continue,
        }
        out.flush()?;
    }
}

/// Prompts on stderr so the report on stdout can be redirected.
pub struct TermPrompter {
    term: Term,
}

impl TermPrompter {
    pub fn new() -> Self {
        TermPrompter { term: Term::stderr() }
    }

    fn ensure_terminal(&self, what: &str) -> io::Result<()> {
        if self.term.is_term() && io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{what} was not given and there is no terminal to ask for it"
            )))
        }
    }
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TermPrompter {
    fn username(&mut self) -> io::Result<String> {
        self.ensure_terminal("Username")?;
        let mut out = self.term.clone();
        read_until_not_blank("Username", &mut out, || self.term.read_line())
    }

    fn password(&mut self) -> io::Result<String> {
        self.ensure_terminal("Password")?;
        let mut out = self.term.clone();
        let mut keys = self.term.clone();
        let mut echo = self.term.clone();
        read_until_not_blank("Password", &mut out, || read_masked(&mut keys, &mut echo))
    }
}
