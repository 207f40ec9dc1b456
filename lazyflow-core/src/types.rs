/// A boxed pull iterator. Every pipeline stage is composed through one.
///
/// `Send` so that a partition's iterator can be opened on a worker thread.
pub type BoxIter<T> = Box<dyn Iterator<Item = T> + Send>;

/// Trait bound for types that can flow through a stream.
/// All element types must satisfy this.
pub trait StreamData: Send + 'static {}

// Blanket implementation: any type satisfying the bounds is StreamData.
impl<T> StreamData for T where T: Send + 'static {}

/// The kind of an operation node in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Map,
    FlatMap,
    Filter,
    Skip,
    Limit,
    Distinct,
    Sorted,
    Peek,
}

impl OpKind {
    /// Whether the node depends on elements other than the current one.
    ///
    /// Stateful nodes act as barriers during parallel evaluation: everything
    /// upstream is materialized in source order before the node runs.
    pub fn is_stateful(self) -> bool {
        matches!(
            self,
            OpKind::Skip | OpKind::Limit | OpKind::Distinct | OpKind::Sorted
        )
    }

    /// Whether the node can change the number of elements passing through it.
    pub fn changes_size(self) -> bool {
        !matches!(self, OpKind::Map | OpKind::Peek | OpKind::Sorted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Map => "map",
            OpKind::FlatMap => "flat_map",
            OpKind::Filter => "filter",
            OpKind::Skip => "skip",
            OpKind::Limit => "limit",
            OpKind::Distinct => "distinct",
            OpKind::Sorted => "sorted",
            OpKind::Peek => "peek",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static properties of a source, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristics {
    /// Elements have a defined encounter order.
    pub ordered: bool,
    /// The exact element count is known before evaluation.
    pub size_known: bool,
    /// The source can be partitioned into independent sub-ranges.
    pub splittable: bool,
}

impl Characteristics {
    /// Ordered, sized and splittable: collections, arrays and ranges.
    pub const fn sized() -> Self {
        Self {
            ordered: true,
            size_known: true,
            splittable: true,
        }
    }

    /// Pure generators and iterator-backed sources.
    pub const fn unsplittable(ordered: bool) -> Self {
        Self {
            ordered,
            size_known: false,
            splittable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stateful_kinds() {
        assert!(OpKind::Sorted.is_stateful());
        assert!(OpKind::Distinct.is_stateful());
        assert!(OpKind::Skip.is_stateful());
        assert!(OpKind::Limit.is_stateful());
        assert!(!OpKind::Map.is_stateful());
        assert!(!OpKind::FlatMap.is_stateful());
        assert!(!OpKind::Filter.is_stateful());
        assert!(!OpKind::Peek.is_stateful());
    }

    #[test]
    fn test_size_changing_kinds() {
        assert!(OpKind::Filter.changes_size());
        assert!(OpKind::Limit.changes_size());
        assert!(!OpKind::Map.changes_size());
        assert!(!OpKind::Sorted.changes_size());
    }

    #[test]
    fn test_op_kind_display() {
        assert_eq!(OpKind::FlatMap.to_string(), "flat_map");
        assert_eq!(OpKind::Limit.to_string(), "limit");
    }

    #[test]
    fn test_stream_data_trait() {
        // Verify common types satisfy StreamData.
        fn assert_stream_data<T: StreamData>() {}
        assert_stream_data::<i32>();
        assert_stream_data::<String>();
        assert_stream_data::<(String, i32)>();
        assert_stream_data::<Vec<u8>>();
    }
}
