// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV codec for the phrase and command tables.
//!
//! Phrases: `phrase_id,weight,phrase_type,vk_audio_id,vk_gif_id,text`.
//! Commands: `id,commands,command_type,media_types,community_ids`, where the
//! last three columns hold comma-separated lists. Empty cells and the literal
//! `null` (any case) mean "absent".

use std::str::FromStr;

use commbot_core::{
    Command, CommandId, CommandKind, ContentDescriptor, MediaKind, Phrase, PhraseKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A table could not be decoded. Carries the 1-based line number when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", line_prefix(.line))]
pub struct CodecError {
    pub line: Option<u64>,
    pub message: String,
}

fn line_prefix(line: &Option<u64>) -> String {
    line.map(|l| format!("line {l}: ")).unwrap_or_default()
}

impl CodecError {
    fn at(line: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        Self::at(line, err.to_string())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct PhraseRow {
    phrase_id: u32,
    weight: u32,
    phrase_type: String,
    vk_audio_id: Option<String>,
    vk_gif_id: Option<String>,
    text: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct CommandRow {
    id: u32,
    commands: String,
    command_type: String,
    media_types: Option<String>,
    community_ids: Option<String>,
}

/// Decodes the phrase table.
pub fn parse_phrases(data: &[u8]) -> Result<Vec<Phrase>, CodecError> {
    let mut reader = reader(data);
    let headers = headers(&mut reader)?;
    let mut phrases = Vec::new();

    for record in reader.records() {
        let record = record.map_err(CodecError::from_csv)?;
        let line = record.position().map(|p| p.line());
        let row: PhraseRow = record
            .deserialize(Some(&headers))
            .map_err(CodecError::from_csv)?;

        let kind = PhraseKind::from_str(row.phrase_type.trim()).map_err(|_| {
            CodecError::at(line, format!("unknown phrase_type `{}`", row.phrase_type))
        })?;

        phrases.push(Phrase {
            id: row.phrase_id,
            weight: row.weight,
            kind,
            text: row.text,
            audio_id: optional(row.vk_audio_id),
            gif_id: optional(row.vk_gif_id),
        });
    }

    Ok(phrases)
}

/// Decodes the command table.
///
/// Info rows ignore the media and community columns. Content rows must name
/// at least one known media type and one community.
pub fn parse_commands(data: &[u8]) -> Result<Vec<Command>, CodecError> {
    let mut reader = reader(data);
    let headers = headers(&mut reader)?;
    let mut commands = Vec::new();

    for record in reader.records() {
        let record = record.map_err(CodecError::from_csv)?;
        let line = record.position().map(|p| p.line());
        let row: CommandRow = record
            .deserialize(Some(&headers))
            .map_err(CodecError::from_csv)?;

        let id = CommandId(row.id);
        let kind = CommandKind::from_str(row.command_type.trim()).map_err(|_| {
            CodecError::at(line, format!("unknown command_type `{}`", row.command_type))
        })?;
        let aliases = split_list(Some(&row.commands));

        let command = match kind {
            CommandKind::Info => Command::info(id, &aliases),
            CommandKind::Content => {
                let media_kinds = split_list(row.media_types.as_deref())
                    .iter()
                    .map(|m| {
                        MediaKind::from_str(m).map_err(|_| {
                            CodecError::at(line, format!("unknown media type `{m}`"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let communities = split_list(row.community_ids.as_deref());
                let descriptor = ContentDescriptor::new(media_kinds, communities).ok_or_else(|| {
                    CodecError::at(
                        line,
                        format!("content command {id} needs media_types and community_ids"),
                    )
                })?;
                Command::new_content(id, &aliases, descriptor)
            }
        }
        .ok_or_else(|| CodecError::at(line, format!("command {id} has no aliases")))?;

        commands.push(command);
    }

    Ok(commands)
}

/// Encodes phrases in table order.
pub fn write_phrases_csv<'a, I>(phrases: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a Phrase>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for phrase in phrases {
        writer
            .serialize(PhraseRow {
                phrase_id: phrase.id,
                weight: phrase.weight,
                phrase_type: phrase.kind.to_string(),
                vk_audio_id: phrase.audio_id.clone(),
                vk_gif_id: phrase.gif_id.clone(),
                text: phrase.text.clone(),
            })
            .map_err(CodecError::from_csv)?;
    }
    finish(writer)
}

/// Encodes commands in table order. Aliases are written case-folded.
pub fn write_commands_csv<'a, I>(commands: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a Command>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for command in commands {
        let (media_types, community_ids) = match command.content() {
            Some(d) => (
                Some(
                    d.media_kinds
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                Some(d.source_communities.join(",")),
            ),
            None => (None, None),
        };
        writer
            .serialize(CommandRow {
                id: command.id().0,
                commands: command
                    .aliases()
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                command_type: command.kind().to_string(),
                media_types,
                community_ids,
            })
            .map_err(CodecError::from_csv)?;
    }
    finish(writer)
}

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(data)
}

fn headers(reader: &mut csv::Reader<&[u8]>) -> Result<csv::StringRecord, CodecError> {
    reader.headers().cloned().map_err(CodecError::from_csv)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, CodecError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CodecError::at(None, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::at(None, e.to_string()))
}

/// Maps empty cells and the literal `null` to `None`.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
        .collect()
}
