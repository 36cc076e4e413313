use std::{collections::VecDeque, fmt, path::Path};

use satchel_shared::log::warn;

use crate::{Error, Result};

/// A single asset that has to be loaded: where to find it and under which name it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    resolved_path: String,
    logical_name: String,
}

impl LoadRequest {
    /// Creates a new [`LoadRequest`]. No validation is done here, the [`LoadQueue`] rejects
    /// incomplete requests when they are pushed.
    pub fn new(resolved_path: impl Into<String>, logical_name: impl Into<String>) -> Self {
        Self {
            resolved_path: resolved_path.into(),
            logical_name: logical_name.into(),
        }
    }

    /// Path of the file, already prefixed with the base path of the manifest.
    pub fn resolved_path(&self) -> &str {
        &self.resolved_path
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.resolved_path)
    }

    /// Name under which the decoded resource is stored.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Both fields must be non-empty and free of whitespace.
    pub fn is_complete(&self) -> bool {
        let is_token = |value: &str| !value.is_empty() && !value.chars().any(char::is_whitespace);
        is_token(&self.resolved_path) && is_token(&self.logical_name)
    }
}

impl fmt::Display for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoadRequest({} -> {})", self.resolved_path, self.logical_name)
    }
}

/// FIFO of [`LoadRequest`]s.
///
/// A queue has exactly one owner at a time. Handing it to a worker moves it, and
/// [`LoadQueue::drain`] takes a snapshot that can be moved while the producer keeps
/// filling the original queue.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadQueue {
    requests: VecDeque<LoadRequest>,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self { requests: VecDeque::new() }
    }

    /// Appends the request at the end of the queue.
    ///
    /// # Example
    ///
    /// ```
    /// use satchel_content::{LoadQueue, LoadRequest};
    /// let mut queue = LoadQueue::new();
    /// assert!(queue.push(LoadRequest::new("art/bg.png", "Background")).is_ok());
    /// assert!(queue.push(LoadRequest::new("", "Empty")).is_err());
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn push(&mut self, request: LoadRequest) -> Result<()> {
        if !request.is_complete() {
            warn!("{request} cannot be enqueued because it is not complete");
            return Err(Error::InvalidRequest {
                path: request.resolved_path,
                name: request.logical_name,
            });
        }
        self.requests.push_back(request);
        Ok(())
    }

    /// Appends all requests in order and returns the errors of the rejected ones.
    pub fn push_all(&mut self, requests: impl IntoIterator<Item = LoadRequest>) -> Vec<Error> {
        requests
            .into_iter()
            .filter_map(|request| self.push(request).err())
            .collect()
    }

    pub fn pop(&mut self) -> Option<LoadRequest> {
        self.requests.pop_front()
    }

    /// Removes all requests and returns them in order as a new queue.
    pub fn drain(&mut self) -> Self {
        Self {
            requests: std::mem::take(&mut self.requests),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadRequest> {
        self.requests.iter()
    }
}

impl IntoIterator for LoadQueue {
    type Item = LoadRequest;
    type IntoIter = std::collections::vec_deque::IntoIter<LoadRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(queue: &LoadQueue) -> Vec<&str> {
        queue.iter().map(LoadRequest::logical_name).collect()
    }

    #[test]
    fn fifo() {
        let mut queue = LoadQueue::new();
        queue.push(LoadRequest::new("a.png", "A")).unwrap();
        queue.push(LoadRequest::new("b.png", "B")).unwrap();
        assert_eq!(queue.pop().unwrap().logical_name(), "A");
        assert_eq!(queue.pop().unwrap().logical_name(), "B");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn reject_incomplete() {
        let mut queue = LoadQueue::new();
        assert!(matches!(
            queue.push(LoadRequest::new("", "Name")),
            Err(Error::InvalidRequest { .. })
        ));
        assert!(queue.push(LoadRequest::new("a.png", "")).is_err());
        assert!(queue.push(LoadRequest::new("a b.png", "Name")).is_err());
        assert!(queue.push(LoadRequest::new("a.png", "My Name")).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_leaves_the_producer_with_an_empty_queue() {
        let mut queue = LoadQueue::new();
        queue.push(LoadRequest::new("a.png", "A")).unwrap();
        queue.push(LoadRequest::new("b.png", "B")).unwrap();

        let snapshot = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(names(&snapshot), vec!["A", "B"]);

        // The producer keeps building without affecting the snapshot
        queue.push(LoadRequest::new("c.png", "C")).unwrap();
        assert_eq!(names(&snapshot), vec!["A", "B"]);
        assert_eq!(names(&queue), vec!["C"]);
    }

    #[test]
    fn into_iter_keeps_order() {
        let mut queue = LoadQueue::new();
        queue.push(LoadRequest::new("a.png", "A")).unwrap();
        queue.push(LoadRequest::new("b.png", "B")).unwrap();
        let names = queue.into_iter().map(|request| request.logical_name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn push_all_returns_the_rejected_requests() {
        let mut queue = LoadQueue::new();
        let rejected = queue.push_all([
            LoadRequest::new("a.png", "A"),
            LoadRequest::new("", "NoPath"),
            LoadRequest::new("b.png", "B"),
            LoadRequest::new("c.png", "Two Words"),
        ]);
        assert_eq!(names(&queue), vec!["A", "B"]);
        assert_eq!(rejected.len(), 2);
        assert!(matches!(&rejected[0], Error::InvalidRequest { name, .. } if name == "NoPath"));
        assert!(matches!(&rejected[1], Error::InvalidRequest { name, .. } if name == "Two Words"));
    }
}
