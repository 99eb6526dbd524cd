use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use hashbrown::HashMap;

use super::VarId;

/// Sum of weighted variables plus a constant.
///
/// Terms are kept in insertion order and may repeat a variable; `merged`
/// combines them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coefficient: f64) -> Self {
        Self {
            terms: vec![(var, coefficient)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// One term per variable in order of first appearance, zero coefficients
    /// dropped.
    pub fn merged(&self) -> Vec<(VarId, f64)> {
        let mut position: HashMap<VarId, usize> = HashMap::with_capacity(self.terms.len());
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());

        for &(var, coefficient) in &self.terms {
            match position.get(&var) {
                Some(&index) => merged[index].1 += coefficient,
                None => {
                    position.insert(var, merged.len());
                    merged.push((var, coefficient));
                }
            }
        }

        merged.retain(|(_, coefficient)| *coefficient != 0.0);
        merged
    }

    /// Value of the expression under dense variable values indexed by `VarId`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var.index()])
            .sum::<f64>()
            + self.constant
    }

    pub(crate) fn take_constant(&mut self) -> f64 {
        std::mem::take(&mut self.constant)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

impl Extend<(VarId, f64)> for LinearExpr {
    fn extend<I: IntoIterator<Item = (VarId, f64)>>(&mut self, iter: I) {
        self.terms.extend(iter);
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, factor: f64) -> LinearExpr {
        for (_, coefficient) in self.terms.iter_mut() {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + (-rhs)
    }
}
