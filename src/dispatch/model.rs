//! Translation of a run configuration and a price series into a linear program.
//!
//! The program is solver-agnostic: variables are plain indices with bounds,
//! the objective is a list of coefficients, and every constraint is an
//! equality row. [`super::solver`] hands it to a concrete backend.

use super::types::SimulationConfig;
use crate::error::ModelBuildDefect;
use crate::market::PriceSeries;

/// Index of one decision variable inside a [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Bounds and display name of one continuous variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// `Σ coef·x = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityConstraint {
    pub terms: Vec<(VarId, f64)>,
    pub rhs: f64,
}

impl EqualityConstraint {
    /// Left-hand side evaluated at `values`, minus the right-hand side.
    pub fn residual(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.0])
            .sum::<f64>()
            - self.rhs
    }
}

/// A continuous linear program over bounded variables with equality rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    variables: Vec<VariableDef>,
    objective: Vec<f64>,
    sense: Sense,
    constraints: Vec<EqualityConstraint>,
}

impl LinearProgram {
    pub fn new(sense: Sense) -> Self {
        Self {
            variables: Vec::new(),
            objective: Vec::new(),
            sense,
            constraints: Vec::new(),
        }
    }

    /// Adds a variable with objective coefficient `cost` and returns its id.
    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64, cost: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef {
            name: name.into(),
            lower,
            upper,
        });
        self.objective.push(cost);
        id
    }

    pub fn add_equality(&mut self, terms: Vec<(VarId, f64)>, rhs: f64) {
        self.constraints.push(EqualityConstraint { terms, rhs });
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Objective coefficient per variable, indexed by [`VarId`].
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn constraints(&self) -> &[EqualityConstraint] {
        &self.constraints
    }

    /// Objective value of an assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }
}

/// Fixed index layout of the dispatch variables for a horizon of `H` hours.
///
/// `charge[t]` lives at `t`, `discharge[t]` at `H + t` and
/// `state_of_charge[t]` at `2H + t` (with `t` running to `H` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    horizon: usize,
}

impl VariableLayout {
    pub fn new(horizon: usize) -> Self {
        Self { horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn charge(&self, t: usize) -> VarId {
        debug_assert!(t < self.horizon);
        VarId(t)
    }

    pub fn discharge(&self, t: usize) -> VarId {
        debug_assert!(t < self.horizon);
        VarId(self.horizon + t)
    }

    pub fn soc(&self, t: usize) -> VarId {
        debug_assert!(t <= self.horizon);
        VarId(2 * self.horizon + t)
    }

    /// Total number of variables: `3H + 1`.
    pub fn len(&self) -> usize {
        3 * self.horizon + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Splits a flat value vector into `(charge, discharge, state_of_charge)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelBuildDefect::ValueCountMismatch`] if `values` does not
    /// hold exactly one entry per variable.
    pub fn split<'a>(&self, values: &'a [f64]) -> Result<(&'a [f64], &'a [f64], &'a [f64]), ModelBuildDefect> {
        if values.len() != self.len() {
            return Err(ModelBuildDefect::ValueCountMismatch {
                expected: self.len(),
                actual: values.len(),
            });
        }
        let h = self.horizon;
        Ok((&values[..h], &values[h..2 * h], &values[2 * h..]))
    }
}

/// Linear program of one dispatch problem, together with its variable layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchModel {
    layout: VariableLayout,
    program: LinearProgram,
}

impl DispatchModel {
    /// Builds the arbitrage program for `config` over `prices`.
    ///
    /// Maximizes `Σ price·discharge − price·charge − degradation_cost·discharge`
    /// subject to `soc[0] = 0` and
    /// `soc[t+1] = soc[t] + efficiency·charge[t] − discharge[t]/efficiency`.
    /// Charge and discharge are bounded by `[0, max_power_mw]`, state of
    /// charge by `[0, capacity_mwh]`.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated run configuration
    /// * `prices` - Hourly prices, one per hour of the horizon
    ///
    /// # Errors
    ///
    /// Returns [`ModelBuildDefect::HorizonMismatch`] if the series length
    /// differs from `config.horizon_hours`.
    pub fn build(config: &SimulationConfig, prices: &PriceSeries) -> Result<Self, ModelBuildDefect> {
        let h = config.horizon_hours;
        if prices.len() != h {
            return Err(ModelBuildDefect::HorizonMismatch {
                expected: h,
                actual: prices.len(),
            });
        }

        let layout = VariableLayout::new(h);
        let mut program = LinearProgram::new(Sense::Maximize);
        let p = prices.as_slice();

        for (t, &price) in p.iter().enumerate() {
            program.add_variable(format!("charge_{t}"), 0.0, config.max_power_mw, -price);
        }
        for (t, &price) in p.iter().enumerate() {
            program.add_variable(
                format!("discharge_{t}"),
                0.0,
                config.max_power_mw,
                price - config.degradation_cost,
            );
        }
        for t in 0..=h {
            program.add_variable(format!("soc_{t}"), 0.0, config.capacity_mwh, 0.0);
        }
        debug_assert_eq!(program.num_variables(), layout.len());

        program.add_equality(vec![(layout.soc(0), 1.0)], 0.0);
        for t in 0..h {
            program.add_equality(
                vec![
                    (layout.soc(t + 1), 1.0),
                    (layout.soc(t), -1.0),
                    (layout.charge(t), -config.efficiency),
                    (layout.discharge(t), 1.0 / config.efficiency),
                ],
                0.0,
            );
        }

        Ok(Self { layout, program })
    }

    pub fn layout(&self) -> VariableLayout {
        self.layout
    }

    pub fn program(&self) -> &LinearProgram {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn toy_config() -> SimulationConfig {
        SimulationConfig {
            capacity_mwh: 10.0,
            max_power_mw: 5.0,
            efficiency: 1.0,
            degradation_cost: 0.0,
            horizon_hours: 3,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn layout_indices_do_not_overlap() {
        let layout = VariableLayout::new(4);
        assert_eq!(layout.charge(3), VarId(3));
        assert_eq!(layout.discharge(0), VarId(4));
        assert_eq!(layout.soc(0), VarId(8));
        assert_eq!(layout.soc(4), VarId(12));
        assert_eq!(layout.len(), 13);
    }

    #[test]
    fn split_rejects_wrong_length() {
        let layout = VariableLayout::new(2);
        let err = layout.split(&[0.0; 6]).unwrap_err();
        assert_eq!(
            err,
            ModelBuildDefect::ValueCountMismatch {
                expected: 7,
                actual: 6
            }
        );
    }

    #[test]
    fn builds_expected_shape() {
        let prices = PriceSeries::from_values(vec![10.0, 100.0, 10.0]).unwrap();
        let model = DispatchModel::build(&toy_config(), &prices).unwrap();
        let lp = model.program();
        assert_eq!(lp.num_variables(), 10);
        // soc[0] pin plus one balance row per hour
        assert_eq!(lp.constraints().len(), 4);
        assert_eq!(lp.sense(), Sense::Maximize);
    }

    #[test]
    fn objective_charges_wear_on_discharge_only() {
        let cfg = SimulationConfig {
            degradation_cost: 7.0,
            ..toy_config()
        };
        let prices = PriceSeries::from_values(vec![10.0, 100.0, 10.0]).unwrap();
        let model = DispatchModel::build(&cfg, &prices).unwrap();
        let layout = model.layout();
        let obj = model.program().objective();

        assert_eq!(obj[layout.charge(1).0], -100.0);
        assert_eq!(obj[layout.discharge(1).0], 93.0);
        assert_eq!(obj[layout.soc(2).0], 0.0);
    }

    #[test]
    fn bounds_follow_battery_limits() {
        let prices = PriceSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let model = DispatchModel::build(&toy_config(), &prices).unwrap();
        let vars = model.program().variables();
        let layout = model.layout();

        assert_eq!(vars[layout.charge(0).0].upper, 5.0);
        assert_eq!(vars[layout.discharge(2).0].upper, 5.0);
        assert_eq!(vars[layout.soc(3).0].upper, 10.0);
        assert!(vars.iter().all(|v| v.lower == 0.0));
    }

    #[test]
    fn balance_rows_use_asymmetric_efficiency() {
        let cfg = SimulationConfig {
            efficiency: 0.8,
            ..toy_config()
        };
        let prices = PriceSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let model = DispatchModel::build(&cfg, &prices).unwrap();
        let layout = model.layout();

        let row = &model.program().constraints()[1];
        assert!(row.terms.contains(&(layout.charge(0), -0.8)));
        let (_, c) = row
            .terms
            .iter()
            .find(|(v, _)| *v == layout.discharge(0))
            .unwrap();
        assert_relative_eq!(*c, 1.25);
    }

    #[test]
    fn idle_schedule_satisfies_every_row() {
        let prices = PriceSeries::from_values(vec![5.0, 50.0, 5.0]).unwrap();
        let model = DispatchModel::build(&toy_config(), &prices).unwrap();
        let zeros = vec![0.0; model.layout().len()];
        for row in model.program().constraints() {
            assert_eq!(row.residual(&zeros), 0.0);
        }
        assert_eq!(model.program().evaluate(&zeros), 0.0);
    }

    #[test]
    fn rejects_horizon_mismatch() {
        let prices = PriceSeries::from_values(vec![1.0, 2.0]).unwrap();
        let err = DispatchModel::build(&toy_config(), &prices).unwrap_err();
        assert_eq!(
            err,
            ModelBuildDefect::HorizonMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
