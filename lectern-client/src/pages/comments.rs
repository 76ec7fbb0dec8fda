use std::sync::Arc;

use crate::{
    api::{Comment, CommentId, CommentOrdering, CommentQuery, CommentUpdate, LectureId, NewComment},
    build_tree, can_reply, forms, Backend, CommentNode, FieldErrors, Loadable, Result, Screen,
};

/// Discussion under one lecture.
///
/// Every successful write is followed by a full refetch, the server's
/// answer being the only source of truth for the tree.
pub struct CommentThread<B> {
    backend: Arc<B>,
    lecture: LectureId,
    ordering: CommentOrdering,
    state: Loadable<Vec<CommentNode>>,
}

impl<B: Backend> CommentThread<B> {
    pub fn new(backend: Arc<B>, lecture: LectureId) -> CommentThread<B> {
        CommentThread {
            backend,
            lecture,
            ordering: CommentOrdering::default(),
            state: Loadable::Loading,
        }
    }

    pub fn lecture(&self) -> LectureId {
        self.lecture
    }

    pub fn ordering(&self) -> CommentOrdering {
        self.ordering
    }

    pub fn state(&self) -> &Loadable<Vec<CommentNode>> {
        &self.state
    }

    /// Number of comments shown, replies included
    pub fn count(&self) -> usize {
        self.state
            .ready()
            .map(|roots| roots.iter().map(|r| r.walk().count()).sum())
            .unwrap_or(0)
    }

    /// Depth of a shown comment, roots being at depth 0
    pub fn depth_of(&self, id: CommentId) -> Option<usize> {
        self.state
            .ready()?
            .iter()
            .flat_map(|root| root.walk())
            .find(|(_, n)| n.id() == id)
            .map(|(depth, _)| depth)
    }

    pub async fn load(&mut self) -> &Loadable<Vec<CommentNode>> {
        self.state = Loadable::Loading;
        let res = self.fetch().await;
        self.state = Loadable::from_result(Screen::Comments, res, |t| t.is_empty());
        &self.state
    }

    pub async fn set_ordering(&mut self, ordering: CommentOrdering) -> &Loadable<Vec<CommentNode>> {
        self.ordering = ordering;
        self.load().await
    }

    pub async fn post(&mut self, content: &str) -> Result<Comment> {
        let content = forms::validate_comment(content)?;
        self.create(None, content).await
    }

    pub async fn reply(&mut self, parent: CommentId, content: &str) -> Result<Comment> {
        let content = forms::validate_comment(content)?;
        let mut errors = FieldErrors::new();
        match self.depth_of(parent) {
            None => errors.add("parent", "This comment no longer exists"),
            Some(depth) if !can_reply(depth) => {
                errors.add("parent", "Replies cannot be nested any deeper")
            }
            Some(_) => (),
        }
        errors.into_result()?;
        self.create(Some(parent), content).await
    }

    pub async fn edit(&mut self, id: CommentId, content: &str) -> Result<Comment> {
        let content = forms::validate_comment(content)?;
        let comment = self
            .backend
            .update_comment(id, &CommentUpdate { content })
            .await?;
        self.refetch().await;
        Ok(comment)
    }

    pub async fn delete(&mut self, id: CommentId) -> Result<()> {
        self.backend.delete_comment(id).await?;
        tracing::debug!(comment = %id, "deleted comment");
        self.refetch().await;
        Ok(())
    }

    async fn create(&mut self, parent: Option<CommentId>, content: String) -> Result<Comment> {
        let comment = self
            .backend
            .create_comment(&NewComment {
                lecture: self.lecture,
                parent,
                content,
            })
            .await?;
        self.refetch().await;
        Ok(comment)
    }

    async fn fetch(&self) -> Result<Vec<CommentNode>> {
        let page = self
            .backend
            .list_comments(&CommentQuery::for_lecture(self.lecture, self.ordering))
            .await?;
        Ok(build_tree(page.results))
    }

    async fn refetch(&mut self) {
        let res = self.fetch().await;
        self.state.refresh(Screen::Comments, res, |t| t.is_empty());
    }
}
