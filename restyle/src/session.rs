//! The interactive editing session behind `restyle session`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Result};
use log::warn;
use restyle_lib::{
    BuildOutcome, ModificationSet, PackageBuilder, ProjectMetadata, StyleRecorder, StyledDocument,
};

const HELP: &str = "\
start                     take the baseline snapshot
stop                      record everything added since start
list                      show the project and its modifications
describe N TEXT           set the description of modification N
remove N                  drop modification N
set name|author|description TEXT
scope domain|page         activate on the whole origin or this page only
export                    build the add-on and choose where to save it
help                      show this text
quit                      leave without exporting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Author,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
    List,
    Describe(usize, String),
    Remove(usize),
    Set(Field, String),
    Scope { applied_to_domain: bool },
    Export,
    Help,
    Quit,
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn parse_index(word: &str) -> Result<usize, String> {
    word.parse()
        .map_err(|_| format!("'{word}' is not a modification number"))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_word(line.trim());
        match word {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "list" => Ok(Command::List),
            "export" => Ok(Command::Export),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "describe" => {
                let (index, text) = split_word(rest);
                Ok(Command::Describe(parse_index(index)?, text.to_string()))
            }
            "remove" => Ok(Command::Remove(parse_index(rest)?)),
            "set" => {
                let (field, text) = split_word(rest);
                let field = match field {
                    "name" => Field::Name,
                    "author" => Field::Author,
                    "description" => Field::Description,
                    other => return Err(format!("unknown field '{other}'")),
                };
                Ok(Command::Set(field, text.to_string()))
            }
            "scope" => match rest {
                "domain" => Ok(Command::Scope {
                    applied_to_domain: true,
                }),
                "page" => Ok(Command::Scope {
                    applied_to_domain: false,
                }),
                _ => Err("usage: scope domain|page".to_string()),
            },
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

/// One page, its recorder and everything recorded on it so far.
pub struct Session<D> {
    document: D,
    builder: PackageBuilder,
    metadata: ProjectMetadata,
    recorder: StyleRecorder,
    mods: ModificationSet,
}

impl<D: StyledDocument> Session<D> {
    pub fn new(document: D, builder: PackageBuilder, metadata: ProjectMetadata) -> Self {
        Session {
            document,
            builder,
            metadata,
            recorder: StyleRecorder::new(),
            mods: ModificationSet::new(),
        }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(
            out,
            "editing '{}' at {}, type 'help' for commands",
            self.metadata.name,
            self.document.url()
        )?;

        let mut line = String::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => command,
                Err(message) => {
                    writeln!(out, "{message}")?;
                    continue;
                }
            };
            if let Err(e) = self.execute(command, input, out) {
                writeln!(out, "error: {e:#}")?;
            }
        }

        if self.recorder.is_recording() {
            warn!("session ended while recording, the pending recording is discarded");
        }
        Ok(())
    }

    fn execute(
        &mut self,
        command: Command,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        match command {
            Command::Start => {
                self.recorder.start_recording(&self.document)?;
                writeln!(out, "recording")?;
            }
            Command::Stop => {
                let modification = self.recorder.stop_recording(&self.document)?;
                let rules = modification.changes().lines().count();
                self.mods.push(modification);
                writeln!(
                    out,
                    "modification [{}] recorded with {rules} rule(s)",
                    self.mods.len() - 1
                )?;
            }
            Command::List => self.list(out)?,
            Command::Describe(index, text) => self.mods.set_description(index, text)?,
            Command::Remove(index) => {
                self.mods.remove(index)?;
            }
            Command::Set(field, text) => match field {
                Field::Name => self.metadata.name = text,
                Field::Author => self.metadata.author = text,
                Field::Description => self.metadata.description = text,
            },
            Command::Scope { applied_to_domain } => {
                let previous =
                    std::mem::replace(&mut self.metadata.applied_to_domain, applied_to_domain);
                match self.metadata.target_scope() {
                    Ok(scope) => writeln!(out, "scope: {scope}")?,
                    Err(e) => {
                        self.metadata.applied_to_domain = previous;
                        return Err(e.into());
                    }
                }
            }
            Command::Export => self.export(input, out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn list(&self, out: &mut impl Write) -> Result<()> {
        let metadata = &self.metadata;
        writeln!(out, "name:        {}", metadata.name)?;
        writeln!(out, "author:      {}", metadata.author)?;
        writeln!(out, "description: {}", metadata.description)?;
        match metadata.target_scope() {
            Ok(scope) => writeln!(out, "scope:       {scope}")?,
            Err(e) => writeln!(out, "scope:       ({e})")?,
        }
        if self.recorder.is_recording() {
            writeln!(out, "(recording)")?;
        }
        for (index, modification) in self.mods.iter().enumerate() {
            writeln!(
                out,
                "[{index}] {} {}",
                modification.target_url(),
                modification.description()
            )?;
            for rule in modification.changes().lines() {
                writeln!(out, "    {rule}")?;
            }
        }
        Ok(())
    }

    fn export(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        if self.recorder.is_recording() {
            bail!("stop recording before exporting");
        }

        let mut prompt = |suggested: &str| -> Option<PathBuf> {
            ask_save_location(&mut *input, &mut *out, suggested)
        };
        let outcome = match self.builder.build(&self.metadata, &self.mods, &mut prompt) {
            Ok(outcome) => outcome,
            Err(e) if e.is_integrity() => {
                return Err(anyhow::Error::new(e).context(format!(
                    "template '{}' is not usable",
                    self.builder.template().display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            BuildOutcome::Saved(path) => writeln!(out, "saved {}", path.display())?,
            BuildOutcome::UserCancelled => writeln!(out, "export cancelled")?,
        }
        Ok(())
    }
}

// A blank answer cancels. A directory answer gets the suggested file name appended.
fn ask_save_location(
    input: &mut impl BufRead,
    out: &mut impl Write,
    suggested: &str,
) -> Option<PathBuf> {
    let mut answer = String::new();
    let asked = write!(out, "save {suggested} to (blank line cancels): ")
        .and_then(|()| out.flush())
        .and_then(|()| input.read_line(&mut answer));
    if let Err(e) = asked {
        warn!("cannot read save location: {e}");
        return None;
    }

    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    let path = Path::new(answer);
    if path.is_dir() {
        Some(path.join(suggested))
    } else {
        Some(path.to_path_buf())
    }
}
