// crates/db/src/queries/grouped.rs
// Grouped aggregates over the session store, hydrated with catalog labels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use timeloom_core::{
    group, AggregateValue, Aggregation, FilterSession, GroupKey, GroupingOption,
};

use crate::{Database, DbResult};

/// One grouped partition, with its catalog label and color where the key
/// refers to a category, tag, or template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: GroupKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub aggregate: AggregateValue,
}

impl Database {
    /// Filter sessions in SQL, partition and aggregate in memory, and
    /// attach display labels from the catalogs.
    pub async fn grouped_totals(
        &self,
        filter: &FilterSession,
        grouping: GroupingOption,
        aggregating: Aggregation,
    ) -> DbResult<Vec<GroupSummary>> {
        let sessions = self.list_sessions(filter).await?;
        // The SQL filter already matched; grouping runs with no filter.
        let results = group(&sessions, &FilterSession::default(), grouping, aggregating);

        let mut labels: HashMap<String, (String, String)> = HashMap::new();
        match grouping {
            GroupingOption::Category => {
                for c in self.list_categories().await? {
                    labels.insert(c.id, (c.name, c.color));
                }
            }
            GroupingOption::Tag => {
                for t in self.list_tags().await? {
                    labels.insert(t.id, (t.label, t.color));
                }
            }
            GroupingOption::Template => {
                for t in self.list_templates().await? {
                    labels.insert(t.id, (t.name, String::new()));
                }
            }
            GroupingOption::User | GroupingOption::Date(_) => {}
        }

        Ok(results
            .into_iter()
            .map(|r| {
                let id = match &r.key {
                    GroupKey::Category(Some(id))
                    | GroupKey::Tag(Some(id))
                    | GroupKey::Template(Some(id)) => Some(id.clone()),
                    _ => None,
                };
                let (label, color) = match id.and_then(|id| labels.get(&id).cloned()) {
                    Some((label, color)) if color.is_empty() => (Some(label), None),
                    Some((label, color)) => (Some(label), Some(color)),
                    None => (None, None),
                };
                GroupSummary {
                    key: r.key,
                    label,
                    color,
                    aggregate: r.aggregate,
                }
            })
            .collect())
    }
}
