// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup structures built from one decoded table.
//!
//! Every index is built in one go from a single table and published behind an
//! `Arc`, so the maps inside it always agree with each other.

use std::collections::HashMap;
use std::sync::Arc;

use commbot_core::types::fold_alias;
use commbot_core::{Command, CommandId, Phrase, PhraseKind};

/// Commands keyed by id and by case-folded alias.
#[derive(Debug, Default)]
pub struct CommandIndex {
    by_id: HashMap<CommandId, Arc<Command>>,
    by_alias: HashMap<String, Arc<Command>>,
    /// Longest alias in characters. Texts longer than this cannot match.
    max_alias_len: usize,
}

impl CommandIndex {
    /// Builds the index. Later rows win on duplicate ids and aliases.
    pub fn build(commands: Vec<Command>) -> Self {
        let mut by_id = HashMap::with_capacity(commands.len());
        let mut by_alias = HashMap::new();
        let mut max_alias_len = 0;

        for command in commands {
            let command = Arc::new(command);
            for alias in command.aliases() {
                max_alias_len = max_alias_len.max(alias.chars().count());
                by_alias.insert(alias.clone(), Arc::clone(&command));
            }
            by_id.insert(command.id(), command);
        }

        // A replaced id may leave aliases pointing at the stale row.
        by_alias.retain(|_, cmd: &mut Arc<Command>| {
            by_id
                .get(&cmd.id())
                .is_some_and(|current| Arc::ptr_eq(current, cmd))
        });

        Self {
            by_id,
            by_alias,
            max_alias_len,
        }
    }

    /// Resolves chat text to a command, ignoring case and surrounding blanks.
    pub fn find_by_alias(&self, text: &str) -> Option<Arc<Command>> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().count() > self.max_alias_len {
            return None;
        }
        self.by_alias.get(&fold_alias(trimmed)).cloned()
    }

    pub fn find_by_id(&self, id: CommandId) -> Option<Arc<Command>> {
        self.by_id.get(&id).cloned()
    }

    /// All commands ordered by id.
    pub fn all(&self) -> Vec<Arc<Command>> {
        let mut all: Vec<_> = self.by_id.values().cloned().collect();
        all.sort_by_key(|c| c.id());
        all
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Phrases grouped by kind, in table order.
#[derive(Debug, Default)]
pub struct PhraseIndex {
    by_kind: HashMap<PhraseKind, Arc<[Phrase]>>,
    total: usize,
}

impl PhraseIndex {
    pub fn build(phrases: Vec<Phrase>) -> Self {
        let total = phrases.len();
        let mut grouped: HashMap<PhraseKind, Vec<Phrase>> = HashMap::new();
        for phrase in phrases {
            grouped.entry(phrase.kind).or_default().push(phrase);
        }
        let by_kind = grouped
            .into_iter()
            .map(|(kind, list)| (kind, Arc::from(list)))
            .collect();
        Self { by_kind, total }
    }

    /// Phrases of one kind. Empty when the table has none.
    pub fn by_kind(&self, kind: PhraseKind) -> Arc<[Phrase]> {
        self.by_kind
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// A consistent view of both tables at one instant.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub commands: Arc<CommandIndex>,
    pub phrases: Arc<PhraseIndex>,
}
