use crate::domain::{
    LearningResource, Project, RecurringTask, StrategyNote, Task, UserAlert, Wallet,
    WatchlistItem,
};

/// Lower-cased searchable text of one record.
#[derive(Debug, Default)]
pub(crate) struct Fields(Vec<String>);

impl Fields {
    fn text(mut self, value: &str) -> Self {
        if !value.trim().is_empty() {
            self.0.push(value.to_lowercase());
        }
        self
    }

    fn optional(self, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(value),
            None => self,
        }
    }

    fn list(self, values: &[String]) -> Self {
        values.iter().fold(self, |fields, value| fields.text(value))
    }

    /// Every token must occur in at least one field. Empty tokens never match.
    pub(crate) fn matches(&self, tokens: &[String]) -> bool {
        !tokens.is_empty()
            && tokens.iter().all(|token| {
                !token.is_empty() && self.0.iter().any(|field| field.contains(token.as_str()))
            })
    }
}

pub(crate) fn project(project: &Project) -> Fields {
    Fields::default()
        .text(&project.name)
        .text(&project.chain)
        .text(&project.notes)
        .optional(project.website.as_deref())
        .list(&project.tags)
}

pub(crate) fn task(task: &Task) -> Fields {
    Fields::default()
        .text(&task.description)
        .optional(task.notes.as_deref())
}

pub(crate) fn wallet(wallet: &Wallet) -> Fields {
    Fields::default()
        .text(&wallet.name)
        .text(&wallet.address)
        .text(&wallet.chain)
}

pub(crate) fn recurring(chore: &RecurringTask) -> Fields {
    Fields::default()
        .text(&chore.name)
        .text(&chore.notes)
        .text(chore.cadence.as_str())
        .list(&chore.tags)
}

pub(crate) fn watchlist(item: &WatchlistItem) -> Fields {
    Fields::default()
        .text(&item.name)
        .text(&item.chain)
        .text(&item.notes)
        .optional(item.website.as_deref())
        .list(&item.tags)
}

pub(crate) fn note(note: &StrategyNote) -> Fields {
    Fields::default()
        .text(&note.title)
        .text(&note.content)
        .list(&note.tags)
}

pub(crate) fn learning(resource: &LearningResource) -> Fields {
    Fields::default()
        .text(&resource.title)
        .text(&resource.content)
        .optional(resource.category.as_deref())
        .list(&resource.tags)
}

pub(crate) fn alert(alert: &UserAlert) -> Fields {
    Fields::default()
        .text(&alert.message)
        .text(alert.alert_type.label())
}

/// Cuts `text` to `max` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_label(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::{truncate_label, Fields};

    #[test]
    fn fields_require_every_token() {
        let fields = Fields::default().text("LayerZero Bridge").text("arbitrum");
        let tokens = |raw: &[&str]| raw.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert!(fields.matches(&tokens(&["bridge", "arb"])));
        assert!(!fields.matches(&tokens(&["bridge", "optimism"])));
        assert!(!fields.matches(&tokens(&[""])));
        assert!(fields.matches(&tokens(&["zero bridge", " "])));
        assert!(!fields.matches(&[]));
    }

    #[test]
    fn labels_are_cut_at_the_character_limit() {
        assert_eq!(truncate_label("short", 32), "short");
        let long = "Provide liquidity on the main pool and stake the LP tokens";
        let cut = truncate_label(long, 32);
        assert_eq!(cut.chars().count(), 33);
        assert!(cut.ends_with('…'));
        assert!(cut.starts_with("Provide liquidity on the main po"));
    }
}
