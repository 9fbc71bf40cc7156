//! Positional ordering of the records attached to a course.

/// A record with an optional rank among its siblings.
pub trait Ordered {
    fn order(&self) -> Option<i64>;

    /// The rank used for sorting; records without one sort first.
    fn sort_key(&self) -> i64 {
        self.order().unwrap_or(0)
    }
}

/// A record tagged with the ID of the course it belongs to.
pub trait Child: Ordered {
    fn id(&self) -> &str;

    fn parent_id(&self) -> Option<&str>;
}

/// Returns the rank for a record appended after `existing`: one past the
/// highest rank present, or 1 if there are no siblings. Freed ranks are
/// never reused.
///
/// ```
/// use course_admin::ordering::{next_order, Ordered};
///
/// struct Rank(Option<i64>);
///
/// impl Ordered for Rank {
///     fn order(&self) -> Option<i64> {
///         self.0
///     }
/// }
///
/// assert_eq!(next_order(&[] as &[Rank]), 1);
/// assert_eq!(next_order(&[Rank(Some(1)), Rank(None), Rank(Some(3))]), 4);
/// ```
pub fn next_order<'a, T, I>(existing: I) -> i64
where
    T: Ordered + 'a,
    I: IntoIterator<Item = &'a T>,
{
    existing
        .into_iter()
        .map(Ordered::sort_key)
        .max()
        .map_or(1, |highest| highest.saturating_add(1).max(1))
}

/// Returns the children listed under `parent_id` (or all of them if it is
/// absent or empty), sorted by rank. Records with equal rank keep their
/// relative order.
pub fn project<T: Child + Clone>(children: &[T], parent_id: Option<&str>) -> Vec<T> {
    let parent_id = parent_id.filter(|p| !p.is_empty());

    let mut projected: Vec<T> = children
        .iter()
        .filter(|child| parent_id.map_or(true, |p| child.parent_id() == Some(p)))
        .cloned()
        .collect();

    projected.sort_by_key(Ordered::sort_key);

    projected
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: String,
        parent: Option<String>,
        order: Option<i64>,
    }

    impl Item {
        fn new(id: &str, parent: Option<&str>, order: Option<i64>) -> Self {
            Item {
                id: id.to_owned(),
                parent: parent.map(str::to_owned),
                order,
            }
        }
    }

    impl Ordered for Item {
        fn order(&self) -> Option<i64> {
            self.order
        }
    }

    impl Child for Item {
        fn id(&self) -> &str {
            &self.id
        }

        fn parent_id(&self) -> Option<&str> {
            self.parent.as_deref()
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn first_child_gets_rank_one() {
        assert_eq!(next_order(&Vec::<Item>::new()), 1);
        assert_eq!(next_order(&[Item::new("a", None, None)]), 1);
    }

    #[test]
    fn ranks_never_drop_below_one() {
        assert_eq!(next_order(&[Item::new("a", None, Some(-7))]), 1);
        assert_eq!(next_order(&[Item::new("a", None, Some(i64::MAX))]), i64::MAX);
    }

    #[test]
    fn gaps_are_not_filled() {
        let items = [Item::new("a", None, Some(1)), Item::new("c", None, Some(3))];

        assert_eq!(next_order(&items), 4);
    }

    #[test]
    fn projection_filters_by_parent_and_sorts() {
        let items = vec![
            Item::new("a", Some("C1"), Some(3)),
            Item::new("b", Some("C2"), Some(1)),
            Item::new("c", Some("C1"), Some(1)),
            Item::new("d", None, Some(2)),
            Item::new("e", Some("C1"), None),
        ];

        assert_eq!(ids(&project(&items, Some("C1"))), vec!["e", "c", "a"]);
        assert_eq!(ids(&project(&items, None)), vec!["e", "b", "c", "d", "a"]);
        assert_eq!(ids(&project(&items, Some(""))), ids(&project(&items, None)));
        assert!(project(&items, Some("C3")).is_empty());
    }

    #[test]
    fn projection_is_stable_on_ties() {
        let items = vec![
            Item::new("x", Some("C1"), Some(2)),
            Item::new("y", Some("C1"), Some(1)),
            Item::new("z", Some("C1"), Some(2)),
        ];

        assert_eq!(ids(&project(&items, Some("C1"))), vec!["y", "x", "z"]);
    }

    proptest! {
        #[test]
        fn next_order_follows_the_highest_rank(orders in prop::collection::vec(prop::option::of(0i64..1_000_000), 1..20)) {
            let items: Vec<Item> = orders
                .iter()
                .enumerate()
                .map(|(n, order)| Item::new(&n.to_string(), None, *order))
                .collect();

            let highest = orders.iter().map(|o| o.unwrap_or(0)).max().unwrap();

            prop_assert_eq!(next_order(&items), highest + 1);
        }

        #[test]
        fn projection_is_sorted_and_complete(orders in prop::collection::vec((prop::bool::ANY, prop::option::of(-5i64..50)), 0..30)) {
            let items: Vec<Item> = orders
                .iter()
                .enumerate()
                .map(|(n, (in_c1, order))| Item::new(&n.to_string(), Some(if *in_c1 { "C1" } else { "C2" }), *order))
                .collect();

            let projected = project(&items, Some("C1"));

            prop_assert!(projected.iter().all(|i| i.parent_id() == Some("C1")));
            prop_assert_eq!(projected.len(), items.iter().filter(|i| i.parent_id() == Some("C1")).count());
            prop_assert!(projected.windows(2).all(|w| w[0].sort_key() <= w[1].sort_key()));
        }
    }
}
