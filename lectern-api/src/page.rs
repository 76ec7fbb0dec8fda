/// Pagination envelope wrapping every list endpoint
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// A page holding the whole result set
    pub fn single(results: Vec<T>) -> Page<T> {
        Page {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
