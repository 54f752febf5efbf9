//! Sample record trees for exercising a graph end to end.

use synbio_core::Record;

use crate::input::SourcedTree;

fn named(label: &str, id: &str) -> Record {
    Record::new(label).with_property("id", id)
}

fn plasmid(id: &str, parts: &[&str]) -> Record {
    parts.iter().fold(named("Plasmid", id), |plasmid, part| {
        plasmid.with_child("BUILT_FROM", named("Part", part))
    })
}

/// A project with one design of two plasmids, two parts each.
pub fn project() -> Record {
    named("Project", "Project 1")
        .with_property("name", "Project 1")
        .with_child(
            "CONTAINS",
            named("Design", "Design 1")
                .with_child("CONTAINS", plasmid("Plasmid 1", &["Part 1", "Part 2"]))
                .with_child("CONTAINS", plasmid("Plasmid 2", &["Part 3", "Part 4"])),
        )
}

/// A plate whose single well holds a plasmid reusing `Part 3` from
/// [`project`].
pub fn plate() -> Record {
    named("Plate", "Plate 1")
        .with_property("name", "Plate 1")
        .with_child(
            "CONTAINS",
            Record::new("Well")
                .with_property("row", "A")
                .with_property("col", 1)
                .with_child(
                    "HOLDS",
                    named("Plasmid", "Plasmid 8").with_child("CONTAINS", named("Part", "Part 3")),
                ),
        )
}

pub fn demo_trees() -> Vec<SourcedTree> {
    [("demo:project", project()), ("demo:plate", plate())]
        .into_iter()
        .map(|(source, record)| SourcedTree {
            source: source.to_string(),
            record,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_trees_are_valid() {
        for tree in demo_trees() {
            assert!(tree.record.validate().is_ok(), "{}", tree.source);
        }
    }

    #[test]
    fn test_project_shape() {
        let project = project();
        assert_eq!(project.record_count(), 8);

        let design = &project.children_of("CONTAINS").unwrap()[0];
        let plasmids = design.children_of("CONTAINS").unwrap();
        assert_eq!(plasmids.len(), 2);
        assert_eq!(plasmids[1].children_of("BUILT_FROM").unwrap().len(), 2);
    }
}
