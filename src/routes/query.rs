use serde::Deserialize;

/// The course filter a screen is currently showing. Replies to list and
/// mutation requests are projected with it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub course: Option<String>,
}

impl ViewQuery {
    pub fn course(&self) -> Option<&str> {
        self.course.as_deref().filter(|c| !c.is_empty())
    }
}
