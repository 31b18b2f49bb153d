//! Grouping fetched lists into display sections.

/// Group `items` into sections keyed by `key_of`, preserving both the order
/// keys are first seen in and the item order inside each section.
pub fn group_by_section_key<T, K, F>(items: Vec<T>, key_of: F) -> Vec<(K, Vec<T>)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut sections: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let key = key_of(&item);
        match sections.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, bucket)) => bucket.push(item),
            None => sections.push((key, vec![item])),
        }
    }
    sections
}
