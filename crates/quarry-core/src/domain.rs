use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

///
/// Direction
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum Direction {
    #[default]
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

///
/// Order
///
/// One sort criterion: a property (dotted path notation) and a direction.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[display("{property}: {direction}")]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    #[must_use]
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

///
/// Sort
///
/// Ordered list of sort criteria. Passed to query methods as a special
/// parameter; never bound to a predicate argument.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Sort {
    #[deref]
    orders: Vec<Order>,
}

impl Sort {
    /// Ascending sort over the given properties, in order.
    #[must_use]
    pub fn by<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            orders: properties.into_iter().map(Order::asc).collect(),
        }
    }

    #[must_use]
    pub fn of(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Concatenate another sort after this one.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.orders.extend(other.orders);
        self
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

impl IntoIterator for Sort {
    type Item = Order;
    type IntoIter = std::vec::IntoIter<Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

///
/// PageRequest
///
/// Zero-based page selection with an optional sort. Special parameter for
/// query methods; the storage adapter applies it to the materialized query.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: Option<Sort>,
}

impl PageRequest {
    /// Page selection without an explicit sort. `size` must be non-zero;
    /// a zero size is clamped to one page element.
    #[must_use]
    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: None,
        }
    }

    #[must_use]
    pub fn sorted(page: usize, size: usize, sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::of(page, size)
        }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Element offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page * self.size
    }

    #[must_use]
    pub fn first(&self) -> Self {
        Self {
            page: 0,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Previous page, or the first page when already at the start.
    #[must_use]
    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_concatenation_preserves_order() {
        let sort = Sort::by(["last_name"]).and(Sort::of(vec![Order::desc("age")]));

        let rendered: Vec<String> = sort.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["last_name: asc", "age: desc"]);
    }

    #[test]
    fn page_navigation_clamps_at_first_page() {
        let request = PageRequest::of(0, 20);
        assert!(!request.has_previous());
        assert_eq!(request.previous_or_first(), request);
        assert_eq!(request.next().page(), 1);
        assert_eq!(request.next().offset(), 20);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(PageRequest::of(3, 0).size(), 1);
    }

    #[test]
    fn page_request_round_trips_through_serde() {
        let request = PageRequest::sorted(2, 10, Sort::by(["name"]));
        let json = serde_json::to_string(&request).expect("serialize page request");
        let back: PageRequest = serde_json::from_str(&json).expect("deserialize page request");
        assert_eq!(back, request);
    }
}
