//! Greedy first-fit grouping of arbitrary items.

#[derive(Debug, Clone, PartialEq)]
pub struct Group<T> {
    /// First member ever added; never reassigned.
    pub representative: T,
    pub members: Vec<T>,
}

impl<T: Clone> Group<T> {
    fn founded_by(item: T) -> Self {
        Self {
            representative: item.clone(),
            members: vec![item],
        }
    }
}

/// Assign each item to the first group whose representative lies within `threshold`.
///
/// Groups keep creation order and members keep input order, so the result is a pure
/// function of the input sequence.
pub fn cluster<T, F>(items: &[T], distance: F, threshold: f64) -> Vec<Vec<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> f64,
{
    cluster_groups(items, distance, threshold)
        .into_iter()
        .map(|group| group.members)
        .collect()
}

pub fn cluster_groups<T, F>(items: &[T], distance: F, threshold: f64) -> Vec<Group<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> f64,
{
    let mut groups: Vec<Group<T>> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|group| distance(&group.representative, item) < threshold)
        {
            Some(group) => group.members.push(item.clone()),
            None => groups.push(Group::founded_by(item.clone())),
        }
    }
    groups
}
