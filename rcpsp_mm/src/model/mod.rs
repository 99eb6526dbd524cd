//! Solver independent description of a mixed integer linear program.

mod expr;

use std::fmt;

use hashbrown::HashMap;
use log::trace;

pub use expr::LinearExpr;

/// Tolerance used when checking an assignment against the model
pub const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarDomain {
    Binary,
    Continuous { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub domain: VarDomain,
}

impl Variable {
    pub fn bounds(&self) -> (f64, f64) {
        match self.domain {
            VarDomain::Binary => (0.0, 1.0),
            VarDomain::Continuous { lower, upper } => (lower, upper),
        }
    }

    pub fn is_binary(&self) -> bool {
        self.domain == VarDomain::Binary
    }

    fn admits(&self, value: f64) -> bool {
        let (lower, upper) = self.bounds();
        let in_bounds = value >= lower - TOLERANCE && value <= upper + TOLERANCE;

        in_bounds && (!self.is_binary() || (value - value.round()).abs() <= TOLERANCE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "="),
        }
    }
}

/// `expr sense rhs`, the expression never carries a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub family: &'static str,
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let lhs = self.expr.evaluate(values);

        match self.sense {
            Sense::Le => lhs <= self.rhs + TOLERANCE,
            Sense::Ge => lhs >= self.rhs - TOLERANCE,
            Sense::Eq => (lhs - self.rhs).abs() <= TOLERANCE,
        }
    }
}

/// Dense values for all variables of a model, indexed by `VarId`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
}

impl Assignment {
    pub fn zeros(variables: usize) -> Self {
        Self {
            values: vec![0.0; variables],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    /// Binary reading of a solved value
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }

    pub fn set(&mut self, var: VarId, value: f64) {
        self.values[var.index()] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbstractModel {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl AbstractModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarDomain::Binary)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(name.into(), VarDomain::Continuous { lower, upper })
    }

    fn add_variable(&mut self, name: String, domain: VarDomain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable { name, domain });
        id
    }

    /// Add `expr sense rhs`; a constant inside `expr` is moved to the right
    /// hand side.
    pub fn add_constraint(
        &mut self,
        family: &'static str,
        name: impl Into<String>,
        mut expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        let rhs = rhs - expr.take_constant();

        self.constraints.push(Constraint {
            family,
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_binaries(&self) -> usize {
        self.variables.iter().filter(|var| var.is_binary()).count()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn evaluate_objective(&self, assignment: &Assignment) -> f64 {
        self.objective.evaluate(assignment.values())
    }

    /// Constraints violated by an assignment
    pub fn violations(&self, assignment: &Assignment) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|constraint| !constraint.is_satisfied(assignment.values()))
            .collect()
    }

    /// Variables whose value lies outside of their domain
    pub fn domain_violations(&self, assignment: &Assignment) -> Vec<&Variable> {
        self.variables
            .iter()
            .zip(assignment.values())
            .filter(|&(var, &value)| !var.admits(value))
            .map(|(var, _)| var)
            .collect()
    }

    pub fn is_feasible(&self, assignment: &Assignment) -> bool {
        if assignment.len() != self.variables.len() {
            return false;
        }

        let violations = self.violations(assignment);
        let domain_violations = self.domain_violations(assignment);
        for constraint in &violations {
            trace!("violated {}: {}", constraint.family, constraint.name);
        }
        for var in &domain_violations {
            trace!("out of domain: {}", var.name);
        }

        violations.is_empty() && domain_violations.is_empty()
    }

    /// Number of constraints per family tag
    pub fn family_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for constraint in &self.constraints {
            *counts.entry(constraint.family).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::{AbstractModel, Assignment, LinearExpr, Sense};

    #[test]
    fn constant_moves_to_the_right_hand_side() {
        let mut model = AbstractModel::new("test");
        let x = model.add_binary("x");
        let s = model.add_continuous("s", 0.0, 10.0);

        model.add_constraint(
            "demo",
            "demo",
            LinearExpr::from(s) - LinearExpr::term(x, 3.0) + LinearExpr::constant(2.0),
            Sense::Le,
            5.0,
        );

        let constraint = &model.constraints()[0];
        assert_eq!(constraint.rhs, 3.0);
        assert_eq!(constraint.expr.constant_value(), 0.0);

        assert!(model.is_feasible(&Assignment::from_values(vec![1.0, 6.0])));
        assert!(!model.is_feasible(&Assignment::from_values(vec![0.0, 6.0])));
        assert_eq!(model.family_counts().get("demo"), Some(&1));
    }

    #[test]
    fn domains_are_checked() {
        let mut model = AbstractModel::new("test");
        model.add_binary("x");
        model.add_continuous("s", 0.0, 2.0);

        assert_eq!(model.num_binaries(), 1);
        assert!(model.is_feasible(&Assignment::from_values(vec![1.0, 1.5])));
        assert!(!model.is_feasible(&Assignment::from_values(vec![0.5, 1.5])));
        assert!(!model.is_feasible(&Assignment::from_values(vec![0.0, 2.5])));
        assert!(!model.is_feasible(&Assignment::from_values(vec![0.0])));
    }
}
