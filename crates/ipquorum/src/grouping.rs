use {
    crate::catalog::EndpointRef,
    derive_more::Debug,
    getset::Getters,
    itertools::Itertools,
    serde::Serialize,
    std::{collections::HashMap, fmt},
};

/// Every collected answer that carried the same value.
#[derive(Clone, PartialEq, Eq, Debug, Getters, Serialize)]
pub struct ResultGroup {
    #[getset(get = "pub")]
    value: String,

    /// In completion order.
    #[getset(get = "pub")]
    origins: Vec<EndpointRef>,
}

impl ResultGroup {
    pub fn new(value: impl Into<String>, origins: Vec<EndpointRef>) -> Self {
        Self {
            value: value.into(),
            origins,
        }
    }

    /// How many endpoints answered with this value.
    pub fn confirmations(&self) -> usize {
        self.origins.len()
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Display for ResultGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}: {})",
            self.value,
            self.origins.len(),
            self.origins.iter().join(", ")
        )
    }
}

/// Buckets successes by value in a single pass.
///
/// Groups come out in the order their value was first seen and origins keep
/// the input order, so the head group is stable for a given arrival order.
pub fn group<I>(successes: I) -> Vec<ResultGroup>
where
    I: IntoIterator<Item = (EndpointRef, String)>,
{
    let mut groups: Vec<ResultGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (endpoint, value) in successes {
        match index.get(&value) {
            Some(&i) => groups[i].origins.push(endpoint),
            None => {
                index.insert(value.clone(), groups.len());
                groups.push(ResultGroup::new(value, vec![endpoint]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(url: &str) -> EndpointRef {
        EndpointRef::new(url)
    }

    #[test]
    fn first_seen_order() {
        let groups = group([
            (e("e1"), "A".to_owned()),
            (e("e2"), "B".to_owned()),
            (e("e3"), "A".to_owned()),
        ]);

        assert_eq!(
            groups,
            vec![
                ResultGroup::new("A", vec![e("e1"), e("e3")]),
                ResultGroup::new("B", vec![e("e2")]),
            ]
        );
    }

    #[test]
    fn not_sorted_by_value_or_count() {
        let groups = group([
            (e("e1"), "Z".to_owned()),
            (e("e2"), "A".to_owned()),
            (e("e3"), "A".to_owned()),
            (e("e4"), "A".to_owned()),
        ]);

        let values: Vec<_> = groups.iter().map(|g| g.value().as_str()).collect();
        assert_eq!(values, ["Z", "A"]);
        assert_eq!(groups[1].confirmations(), 3);
    }

    #[test]
    fn empty_input() {
        assert!(group(Vec::new()).is_empty());
    }

    #[test]
    fn display() {
        let g = ResultGroup::new("1.2.3.4", vec![e("a"), e("b")]);
        assert_eq!(g.to_string(), "1.2.3.4 (2: a, b)");
    }
}
