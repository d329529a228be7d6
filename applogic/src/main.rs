// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use clap::Parser;
use parleyapplogic::{
    ChatSession, MessageListState, configurations::get_configuration, logging::init_logger,
};
use parleycoreclient::{Identity, LocalMedia, MediaKind, Message, MessageContent, SenderId};
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    sync::watch,
};
use url::Url;
use uuid::Uuid;

/// Terminal chat client
///
/// Prints the messages of the chat and sends every line read from stdin. Lines starting with
/// `/photo <path>` or `/video <path>` send the file instead.
#[derive(Debug, Parser)]
struct Args {
    /// Id to send messages as; a random id if not given
    #[arg(long)]
    sender_id: Option<SenderId>,

    /// Display name; sends anonymously if not given
    #[arg(long)]
    name: Option<String>,

    /// URL of the avatar picture published with the user record
    #[arg(long)]
    profile_url: Option<Url>,

    /// Prefix of the `configuration` directory
    #[arg(long, default_value = "")]
    config_prefix: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger();

    let settings = get_configuration(&args.config_prefix)?;
    let sender_id = match args.sender_id {
        Some(sender_id) => sender_id,
        None => SenderId::new(Uuid::new_v4().to_string())?,
    };
    let identity = match args.name {
        Some(name) => Identity::new(sender_id, name),
        None => Identity::anonymous(sender_id),
    };
    let identity = match args.profile_url {
        Some(profile_url) => identity.with_profile_url(profile_url),
        None => identity,
    };

    let session = ChatSession::start(&settings, identity).await?;
    let message_list = session.message_list();
    let printer = tokio::spawn(print_messages(message_list.subscribe()));

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let res = match parse_command(&line) {
            None => continue,
            Some(Command::Text(text)) => session.send_text(text).await,
            Some(Command::Media(kind, path)) => session
                .send_media(kind, LocalMedia::File(path))
                .await
                .map(|_url| ()),
        };
        if let Err(error) = res {
            eprintln!("{error}");
        }
    }

    drop(message_list);
    session.stop().await;
    printer.abort();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Text(&'a str),
    Media(MediaKind, PathBuf),
}

fn parse_command(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let media = |kind, path: &str| {
        let path = path.trim();
        (!path.is_empty()).then(|| Command::Media(kind, path.into()))
    };
    if let Some(path) = line.strip_prefix("/photo ") {
        media(MediaKind::Photo, path)
    } else if let Some(path) = line.strip_prefix("/video ") {
        media(MediaKind::Video, path)
    } else {
        Some(Command::Text(line))
    }
}

/// Prints new messages, and media messages again once their media is loaded.
async fn print_messages(mut states: watch::Receiver<MessageListState>) {
    // whether the printed message was a placeholder
    let mut printed: Vec<bool> = Vec::new();
    loop {
        let state = states.borrow_and_update().clone();
        for index in 0..state.loaded_messages_count() {
            let Some(message) = state.message_at(index) else {
                break;
            };
            let is_placeholder = message.content().is_placeholder();
            let reprint = match printed.get_mut(index) {
                None => {
                    printed.push(is_placeholder);
                    true
                }
                Some(was_placeholder) if *was_placeholder && !is_placeholder => {
                    *was_placeholder = false;
                    true
                }
                Some(_) => false,
            };
            if reprint {
                println!("{}", format_message(&message, state.is_outgoing(index)));
            }
        }
        if states.changed().await.is_err() {
            return;
        }
    }
}

fn format_message(message: &Message, is_outgoing: bool) -> String {
    let direction = if is_outgoing { '>' } else { '<' };
    let body = match message.content() {
        MessageContent::Text { text } => text.clone(),
        MessageContent::Photo { url, media } | MessageContent::Video { url, media } => {
            let kind = message.kind();
            match media.payload() {
                None => format!("[{kind} loading] {url}"),
                Some(payload) => match payload.dimensions() {
                    Some((width, height)) => format!("[{kind} {width}x{height}] {url}"),
                    None => format!(
                        "[{kind} {}, {} bytes] {url}",
                        payload.content_type(),
                        payload.bytes().len()
                    ),
                },
            }
        }
    };
    format!("{direction} {}: {body}", message.sender_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command(" hi "), Some(Command::Text("hi")));
        assert_eq!(
            parse_command("/photo /tmp/cat.jpg"),
            Some(Command::Media(MediaKind::Photo, "/tmp/cat.jpg".into()))
        );
        assert_eq!(
            parse_command("/video clip.mp4"),
            Some(Command::Media(MediaKind::Video, "clip.mp4".into()))
        );
        assert_eq!(parse_command("/photo "), Some(Command::Text("/photo")));
        assert_eq!(parse_command("/photos"), Some(Command::Text("/photos")));
    }
}
