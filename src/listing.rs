use crate::domain::{MyStatus, Project};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListFilter {
    pub include_archived: bool,
    pub my_status: Option<MyStatus>,
    pub chain: Option<String>,
    pub tags: Vec<String>,
    pub query: Option<String>,
}

pub fn apply_filters(projects: Vec<Project>, filter: &ProjectListFilter) -> Vec<Project> {
    let normalized = NormalizedFilter::from(filter);
    if normalized.has_no_user_filters() && normalized.include_archived {
        return projects;
    }

    projects
        .into_iter()
        .filter(|project| matches_filter(project, &normalized))
        .collect()
}

#[derive(Debug, Clone, Default)]
struct NormalizedFilter {
    include_archived: bool,
    my_status: Option<MyStatus>,
    chain: Option<String>,
    tags: Vec<String>,
    query: Option<String>,
}

impl NormalizedFilter {
    fn has_no_user_filters(&self) -> bool {
        self.my_status.is_none()
            && self.chain.is_none()
            && self.tags.is_empty()
            && self.query.is_none()
    }
}

impl From<&ProjectListFilter> for NormalizedFilter {
    fn from(value: &ProjectListFilter) -> Self {
        Self {
            include_archived: value.include_archived,
            my_status: value.my_status,
            chain: normalize_scalar(value.chain.as_deref()),
            tags: value
                .tags
                .iter()
                .filter_map(|tag| normalize_scalar(Some(tag)))
                .collect(),
            query: normalize_scalar(value.query.as_deref()),
        }
    }
}

fn matches_filter(project: &Project, filter: &NormalizedFilter) -> bool {
    if project.is_archived && !filter.include_archived {
        return false;
    }

    if let Some(expected) = filter.my_status {
        if project.my_status != expected {
            return false;
        }
    }

    if let Some(expected_chain) = filter.chain.as_deref() {
        if project.chain.trim().to_lowercase() != expected_chain {
            return false;
        }
    }

    if !has_all_tags(project, &filter.tags) {
        return false;
    }

    if let Some(query) = filter.query.as_deref() {
        return matches_query(project, query);
    }

    true
}

fn has_all_tags(project: &Project, required_tags: &[String]) -> bool {
    if required_tags.is_empty() {
        return true;
    }
    let project_tags: Vec<String> = project
        .tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .collect();
    required_tags
        .iter()
        .all(|tag| project_tags.iter().any(|existing| existing == tag))
}

fn matches_query(project: &Project, query: &str) -> bool {
    project.name.to_lowercase().contains(query)
        || project.chain.to_lowercase().contains(query)
        || project.notes.to_lowercase().contains(query)
        || project
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(query))
}

fn normalize_scalar(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
