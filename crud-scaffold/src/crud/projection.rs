//! Entity-to-model mapping helpers

/// Maps one model type onto another
///
/// Handy inside [`EntityCapabilities::to_view_model`](super::EntityCapabilities::to_view_model)
/// implementations, and for moving between persistence rows and domain entities.
///
/// ```rust
/// use crud_scaffold::crud::EntityMapper;
///
/// struct Row { id: i64, label: String }
/// struct Summary { id: i64 }
///
/// struct SummaryMapper;
///
/// impl EntityMapper<Row, Summary> for SummaryMapper {
///     fn map(&self, source: Row) -> Summary {
///         Summary { id: source.id }
///     }
/// }
///
/// let rows = vec![Row { id: 1, label: "a".into() }, Row { id: 2, label: "b".into() }];
/// let summaries = SummaryMapper.map_all(rows);
/// assert_eq!(summaries.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub trait EntityMapper<S, D> {
    /// Map a single value
    fn map(&self, source: S) -> D;

    /// Map every value, preserving order
    fn map_all(&self, sources: impl IntoIterator<Item = S>) -> Vec<D> {
        sources.into_iter().map(|source| self.map(source)).collect()
    }
}
