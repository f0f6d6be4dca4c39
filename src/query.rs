use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Usage pattern a structural search looks for.
///
/// Each variant maps to a fixed SmPL rule shape; the set is closed, so an
/// unrecognized operation can only appear at the CLI boundary where it is
/// rejected during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Any occurrence of a variable of the searched type.
    Used,
    /// Dereference of a named attribute (`p->attr`).
    Deref,
    /// Mutation of a named attribute (`=`, `|=`, `+=`, `-=`).
    Set,
    /// Comparison or bit-test of a named attribute.
    Test,
}

impl Operation {
    /// Name used in rendered match prefixes and CLI input.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Used => "used",
            Operation::Deref => "deref",
            Operation::Set => "set",
            Operation::Test => "test",
        }
    }

    /// Whether this operation is meaningless without an attribute.
    pub fn requires_attribute(&self) -> bool {
        !matches!(self, Operation::Used)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "used" => Ok(Operation::Used),
            "deref" => Ok(Operation::Deref),
            "set" => Ok(Operation::Set),
            "test" => Ok(Operation::Test),
            other => Err(QueryError::UnknownOperation {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("unknown operation '{name}' (expected used, deref, set or test)")]
    UnknownOperation { name: String },

    #[error("operation '{operation}' requires an attribute")]
    MissingAttribute { operation: Operation },
}

/// A validated structural search: which type, which attribute, which usage
/// pattern.
///
/// Construction enforces that `Deref`, `Set` and `Test` carry a non-empty
/// attribute; `Used` may search for the bare type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    operation: Operation,
    type_name: String,
    attribute: String,
}

impl Query {
    pub fn new(
        operation: Operation,
        type_name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let attribute = attribute.into();
        if operation.requires_attribute() && attribute.is_empty() {
            return Err(QueryError::MissingAttribute { operation });
        }
        Ok(Self {
            operation,
            type_name: type_name.into(),
            attribute,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Build the complete SmPL program for this query.
    ///
    /// The program is a pattern rule followed by the fixed extraction rule
    /// that prints one `file:line:column:line_end:column_end` quintuple per
    /// match. Pure string assembly; nothing touches the filesystem here.
    pub fn program(&self) -> String {
        let pattern = match self.operation {
            // `used` with an attribute narrows to the dereference form.
            Operation::Used if self.attribute.is_empty() => smpl::used(&self.type_name),
            Operation::Used | Operation::Deref => smpl::deref(&self.type_name, &self.attribute),
            Operation::Set => smpl::set(&self.type_name, &self.attribute),
            Operation::Test => smpl::test(&self.type_name, &self.attribute),
        };
        pattern + smpl::PRINT_POSITIONS
    }
}

/// SmPL rule fragments, one builder per operation.
///
/// The operator tables are fixed data; the alternation order inside `set`
/// and `test` is part of the engine-facing contract.
mod smpl {
    pub(super) const SET_OPERATORS: [&str; 4] = ["|=", "=", "+=", "-="];
    pub(super) const TEST_OPERATORS: [&str; 7] = ["==", "!=", "&", "<", "<=", ">", ">="];

    /// Rule header declaring the typed pointer and the position binding.
    fn header(type_name: &str, with_expression: bool) -> String {
        let expression = if with_expression { "expression E;\n" } else { "" };
        format!("@init@\ntypedef {type_name};\n{type_name} *p;\n{expression}position p1;\n@@\n\n")
    }

    pub(super) fn used(type_name: &str) -> String {
        format!("{}p@p1\n", header(type_name, false))
    }

    pub(super) fn deref(type_name: &str, attribute: &str) -> String {
        format!("{}p@p1->{attribute}\n", header(type_name, false))
    }

    pub(super) fn set(type_name: &str, attribute: &str) -> String {
        let branches: Vec<String> = SET_OPERATORS
            .iter()
            .map(|op| format!("p@p1->{attribute} {op} E"))
            .collect();
        format!("{}(\n{}\n)\n", header(type_name, true), branches.join("\n|\n"))
    }

    pub(super) fn test(type_name: &str, attribute: &str) -> String {
        let mut branches = Vec::with_capacity(TEST_OPERATORS.len() * 2);
        for op in TEST_OPERATORS {
            branches.push(format!("p@p1->{attribute} {op} E"));
        }
        for op in TEST_OPERATORS {
            branches.push(format!("E {op} p@p1->{attribute}"));
        }
        format!("{}(\n{}\n)\n", header(type_name, true), branches.join("\n|\n"))
    }

    /// Extraction rule printing every position bound by the pattern rule.
    pub(super) const PRINT_POSITIONS: &str = "\n@ script:python @\np1 << init.p1;\n@@\n\nfor p in p1:\n    print(\"%s:%s:%s:%s:%s\" % (p.file, p.line, p.column, p.line_end, p.column_end))\n";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_pattern_forms(program: &str) -> usize {
        program.matches("p@p1").count()
    }

    #[test]
    fn used_program_matches_bare_pointer() {
        let query = Query::new(Operation::Used, "Packet", "").unwrap();
        let program = query.program();

        assert!(program.contains("typedef Packet;"));
        assert!(program.contains("Packet *p;"));
        assert!(program.contains("position p1;"));
        assert_eq!(count_pattern_forms(&program), 1);
        assert!(!program.contains("expression E;"));
    }

    #[test]
    fn used_with_attribute_narrows_to_deref() {
        let query = Query::new(Operation::Used, "Packet", "flags").unwrap();
        let program = query.program();

        assert!(program.contains("p@p1->flags"));
        assert_eq!(count_pattern_forms(&program), 1);
    }

    #[test]
    fn deref_program_matches_attribute_access() {
        let query = Query::new(Operation::Deref, "Packet", "payload").unwrap();
        let program = query.program();

        assert!(program.contains("p@p1->payload"));
        assert_eq!(count_pattern_forms(&program), 1);
    }

    #[test]
    fn set_program_alternates_the_four_mutating_operators() {
        let query = Query::new(Operation::Set, "Packet", "flags").unwrap();
        let program = query.program();

        assert_eq!(count_pattern_forms(&program), 4);
        assert!(program.contains("expression E;"));

        // alternation order is fixed
        let or_eq = program.find("p@p1->flags |= E").unwrap();
        let assign = program.find("p@p1->flags = E").unwrap();
        let add = program.find("p@p1->flags += E").unwrap();
        let sub = program.find("p@p1->flags -= E").unwrap();
        assert!(or_eq < assign && assign < add && add < sub);
    }

    #[test]
    fn test_program_covers_both_operand_orders() {
        let query = Query::new(Operation::Test, "Packet", "flags").unwrap();
        let program = query.program();

        assert_eq!(count_pattern_forms(&program), 14);
        for op in smpl::TEST_OPERATORS {
            assert!(program.contains(&format!("p@p1->flags {op} E")));
            assert!(program.contains(&format!("E {op} p@p1->flags")));
        }
    }

    #[test]
    fn every_program_ends_with_the_extraction_rule() {
        for operation in [Operation::Used, Operation::Deref, Operation::Set, Operation::Test] {
            let query = Query::new(operation, "Packet", "flags").unwrap();
            let program = query.program();
            assert!(program.contains("script:python"));
            assert!(program.contains("p1 << init.p1;"));
            assert!(program.contains("%s:%s:%s:%s:%s"));
        }
    }

    #[test]
    fn attribute_required_for_deref_set_test() {
        for operation in [Operation::Deref, Operation::Set, Operation::Test] {
            let result = Query::new(operation, "Packet", "");
            assert!(matches!(
                result,
                Err(QueryError::MissingAttribute { operation: op }) if op == operation
            ));
        }
    }

    #[test]
    fn bare_used_needs_no_attribute() {
        assert!(Query::new(Operation::Used, "Packet", "").is_ok());
    }

    #[test]
    fn operation_parses_from_cli_names() {
        assert_eq!("used".parse::<Operation>().unwrap(), Operation::Used);
        assert_eq!("deref".parse::<Operation>().unwrap(), Operation::Deref);
        assert_eq!("set".parse::<Operation>().unwrap(), Operation::Set);
        assert_eq!("test".parse::<Operation>().unwrap(), Operation::Test);

        let err = "grep".parse::<Operation>().unwrap_err();
        assert!(matches!(err, QueryError::UnknownOperation { name } if name == "grep"));
    }
}
