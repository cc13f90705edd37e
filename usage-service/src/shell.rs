use std::{path::PathBuf, str::FromStr};

use energy_client::UserName;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{dashboard, recorder::UsageRecorder, views};

const HELP: &str = "Commands:\n  \
    home                      show the welcome page\n  \
    name <NAME>               set who is logging\n  \
    log <APPLIANCE>[, ...]    log appliances that are on\n  \
    dashboard                 show your usage dashboard\n  \
    appliances                list known appliances\n  \
    help                      show this help\n  \
    quit                      leave\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    Name(String),
    Log(Vec<String>),
    Dashboard,
    Appliances,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        match word.to_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "name" => Ok(Self::Name(rest.to_string())),
            "log" => Ok(Self::Log(
                rest.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            "dashboard" => Ok(Self::Dashboard),
            "appliances" => Ok(Self::Appliances),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}', try `help`")),
        }
    }
}

/// One interactive session. Holds the session's user for its lifetime only.
pub struct Shell {
    recorder: UsageRecorder,
    store_path: PathBuf,
    recent_limit: usize,
    user: Option<UserName>,
}

impl Shell {
    pub fn new(recorder: UsageRecorder, store_path: PathBuf, recent_limit: usize) -> Self {
        Self {
            recorder,
            store_path,
            recent_limit,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&UserName> {
        self.user.as_ref()
    }

    /// Run `command`, returning the text to show, or `None` to end the session.
    pub async fn execute(&mut self, command: Command) -> Option<String> {
        let out = match command {
            Command::Home => views::home(),
            Command::Name(raw) => {
                self.user = UserName::parse(&raw);
                match &self.user {
                    Some(user) => format!("Hello, {user}!\n"),
                    None => "Name cleared.\n".to_string(),
                }
            }
            Command::Log(appliances) => {
                let name = self.user.as_ref().map(UserName::as_str).unwrap_or_default();
                let result = self.recorder.record(name, &appliances).await;
                views::log_outcome(&result)
            }
            Command::Dashboard => {
                let view = dashboard::load(&self.store_path, self.user.as_ref(), self.recent_limit);
                dashboard::render(&view)
            }
            Command::Appliances => views::appliances(self.recorder.catalog()),
            Command::Help => HELP.to_string(),
            Command::Quit => return None,
        };
        Some(out)
    }

    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        output.write_all(views::home().as_bytes()).await?;
        output.write_all(b"Type `help` for commands.\n").await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"> ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let text = match line.parse::<Command>() {
                Ok(command) => match self.execute(command).await {
                    Some(text) => text,
                    None => break,
                },
                Err(msg) => format!("{msg}\n"),
            };
            output.write_all(text.as_bytes()).await?;
        }

        output.flush().await
    }
}
