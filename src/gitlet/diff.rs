use std::collections::BTreeMap;

use super::Digest;

/// Path to blob digest, as recorded by a commit.
pub type Tree = BTreeMap<String, Digest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Deleted,
    Modified,
}

/// Line up several trees path by path. Each entry holds one slot per input tree, in
/// input order, with `None` where that tree lacks the path.
pub fn compare_trees<'a>(trees: &[&'a Tree]) -> BTreeMap<&'a str, Vec<Option<&'a Digest>>> {
    let mut entries: BTreeMap<&str, Vec<Option<&Digest>>> = BTreeMap::new();

    for (i, tree) in trees.iter().copied().enumerate() {
        for (path, digest) in tree {
            let digests = entries
                .entry(path.as_str())
                .or_insert_with(|| vec![None; trees.len()]);
            digests[i] = Some(digest);
        }
    }

    entries
}

/// Paths whose digest differs between `t_from` and `t_to`, sorted by path.
pub fn changed_files<'a>(t_from: &'a Tree, t_to: &'a Tree) -> Vec<(&'a str, Change)> {
    let mut result = vec![];

    for (path, digests) in compare_trees(&[t_from, t_to]) {
        let change = match (digests[0], digests[1]) {
            (None, Some(_)) => Change::Added,
            (Some(_), None) => Change::Deleted,
            (Some(from), Some(to)) if from != to => Change::Modified,
            _ => continue,
        };
        result.push((path, change));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlet::data::hash;

    fn tree(entries: &[(&str, &str)]) -> Tree {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), hash(content.as_bytes())))
            .collect()
    }

    #[test]
    fn compare_trees_fills_missing_slots_with_none() {
        let a = tree(&[("x", "1"), ("y", "1")]);
        let b = tree(&[("y", "2"), ("z", "2")]);

        let entries = compare_trees(&[&a, &b]);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["x"], vec![a.get("x"), None]);
        assert_eq!(entries["z"], vec![None, b.get("z")]);
    }

    #[test]
    fn changed_files_classifies_each_path() {
        let from = tree(&[("same", "1"), ("gone", "1"), ("edited", "1")]);
        let to = tree(&[("same", "1"), ("edited", "2"), ("new", "1")]);

        assert_eq!(
            changed_files(&from, &to),
            vec![
                ("edited", Change::Modified),
                ("gone", Change::Deleted),
                ("new", Change::Added),
            ]
        );
    }
}
