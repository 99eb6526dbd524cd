// Instance files are plain JSON, serde does the parsing and validation of the
// content happens once the raw file is turned into a model instance.

use structs::InstanceFile;
use thiserror::Error;

pub mod structs;

#[derive(Debug, Error)]
pub enum InstanceParseError {
    #[error("malformed instance file: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_instance(content: &str) -> Result<InstanceFile, InstanceParseError> {
    Ok(serde_json::from_str(content)?)
}

pub fn write_instance(instance: &InstanceFile, pretty: bool) -> Result<String, InstanceParseError> {
    let content = if pretty {
        serde_json::to_string_pretty(instance)?
    } else {
        serde_json::to_string(instance)?
    };

    Ok(content)
}

#[cfg(test)]
mod tests {
    use crate::{parse_instance, write_instance};

    static CHAIN_FILE: &str = include_str!("../../instances/chain.json");
    static LINKED_FILE: &str = include_str!("../../instances/linked.json");

    #[test]
    fn chain_parsing() {
        let instance = parse_instance(CHAIN_FILE);
        assert!(instance.is_ok());

        let instance = instance.unwrap();
        assert_eq!(instance.n, 3);
        assert_eq!(instance.horizon, 6);
        assert_eq!(instance.modes, 1);
        assert_eq!(instance.capacities, vec![1]);
        assert_eq!(instance.precedences, vec![[0, 1], [1, 2]]);
        assert_eq!(instance.durations, vec![vec![0], vec![3], vec![0]]);
        assert!(instance.linked.is_empty());
        assert_eq!(instance.requirements[1], vec![vec![1]]);
    }

    #[test]
    fn linked_parsing() {
        let instance = parse_instance(LINKED_FILE).unwrap();

        dbg!(&instance);
        assert_eq!(instance.linked, vec![[1, 2]]);
        assert_eq!(instance.durations[2], vec![2, 3]);
        assert_eq!(instance.requirements[2], vec![vec![2], vec![1]]);
    }

    #[test]
    fn missing_linked_pairs_default_to_empty() {
        let content = r#"{"n": 2, "T": 1, "M": 1, "R": [], "E": [[0, 1]], "p": [[0], [0]], "r": [[[]], [[]]]}"#;

        let instance = parse_instance(content).unwrap();
        assert!(instance.linked.is_empty());
    }

    #[test]
    fn negative_values_survive_parsing() {
        let content = r#"{"n": 3, "T": 4, "M": 1, "R": [1], "E": [[0, 1], [1, 2]], "p": [[0], [-2], [0]], "L": [], "r": [[[0]], [[1]], [[0]]]}"#;

        let instance = parse_instance(content).unwrap();
        assert_eq!(instance.durations[1], vec![-2]);
    }

    #[test]
    fn missing_durations_fail() {
        let content = r#"{"n": 2, "T": 1, "M": 1, "R": [], "E": [[0, 1]], "r": [[[]], [[]]]}"#;

        let output = parse_instance(content);
        assert!(output.is_err());
    }

    #[test]
    fn malformed_edge_fails() {
        let content = r#"{"n": 2, "T": 1, "M": 1, "R": [], "E": [[0, 1, 2]], "p": [[0], [0]], "r": [[[]], [[]]]}"#;

        assert!(parse_instance(content).is_err());
    }

    #[test]
    fn written_instance_keeps_file_keys() {
        let instance = parse_instance(CHAIN_FILE).unwrap();

        let content = write_instance(&instance, false).unwrap();
        assert!(content.contains("\"T\":6"));
        assert!(content.contains("\"E\":[[0,1],[1,2]]"));
        assert_eq!(parse_instance(&content).unwrap(), instance);
    }

    #[test]
    fn garbage_fails() {
        let content = "asd";

        let output = parse_instance(content);

        assert!(output.is_err());
    }
}
