//! Expansion of the active nodes into per-evaluation-point parameters.

use crate::integrate::executor::ParallelExecutor;

use super::nodes::Node;
use super::rule::GaussKronrodRule;

/// Everything needed to evaluate one rule point of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRecord {
    pub bin_id: u32,
    pub abscissa_plus: f64,
    pub abscissa_minus: f64,
    pub jacobian: f64,
    pub kronrod_weight: f64,
    pub gauss_weight: f64,
}

impl ParameterRecord {
    /// Whether both abscissas coincide (the rule's centre point).
    #[inline]
    pub fn is_centre(&self) -> bool {
        self.abscissa_plus == self.abscissa_minus
    }

    /// Number of integrand calls this record costs on a scalar executor.
    #[inline]
    pub fn evaluations(&self) -> usize {
        if self.is_centre() { 1 } else { 2 }
    }
}

/// Column-wise copy of a parameter table, ready for upload to a device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterColumns {
    pub bin_ids: Vec<u32>,
    pub abscissa_plus: Vec<f64>,
    pub abscissa_minus: Vec<f64>,
    pub jacobian: Vec<f64>,
    pub kronrod_weight: Vec<f64>,
    pub gauss_weight: Vec<f64>,
}

impl ParameterColumns {
    pub fn from_records(records: &[ParameterRecord]) -> Self {
        let n = records.len();
        let mut columns = Self {
            bin_ids: Vec::with_capacity(n),
            abscissa_plus: Vec::with_capacity(n),
            abscissa_minus: Vec::with_capacity(n),
            jacobian: Vec::with_capacity(n),
            kronrod_weight: Vec::with_capacity(n),
            gauss_weight: Vec::with_capacity(n),
        };
        for r in records {
            columns.bin_ids.push(r.bin_id);
            columns.abscissa_plus.push(r.abscissa_plus);
            columns.abscissa_minus.push(r.abscissa_minus);
            columns.jacobian.push(r.jacobian);
            columns.kronrod_weight.push(r.kronrod_weight);
            columns.gauss_weight.push(r.gauss_weight);
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.bin_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bin_ids.is_empty()
    }
}

/// Build the parameter table for every active node.
///
/// Work items are enumerated point-major (`point * n_active + node`) and
/// mapped on the executor; the result is then grouped by bin id, so each
/// active node owns one contiguous run of `rule.n_points()` records in point
/// order.
pub fn expand_parameters<E>(
    executor: &E,
    rule: &GaussKronrodRule,
    active: &[Node],
) -> Vec<ParameterRecord>
where
    E: ParallelExecutor,
{
    let n_active = active.len();
    let work: Vec<usize> = (0..n_active * rule.n_points()).collect();

    let records = executor.map(&work, |&index| {
        let point = index / n_active;
        let node = &active[index % n_active];
        let (abscissa_plus, abscissa_minus, jacobian) =
            rule.abscissa(point, node.lower, node.upper);
        ParameterRecord {
            bin_id: node.bin_id,
            abscissa_plus,
            abscissa_minus,
            jacobian,
            kronrod_weight: rule.kronrod_weight(point),
            gauss_weight: rule.gauss_weight(point),
        }
    });

    executor.group_by_key(records, |r| r.bin_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::executor::{Sequential, Threaded};
    use crate::integrate::quadrature::{NodeTable, RuleOrder, Verdict};

    #[test]
    fn test_one_group_per_active_node() {
        let rule = GaussKronrodRule::new(RuleOrder::K21);
        let table = NodeTable::init(0.0, 4.0, 3).refine(&[
            Verdict::Bisect,
            Verdict::Retire,
            Verdict::Bisect,
        ]);
        let params = expand_parameters(&Sequential, &rule, table.active());
        assert_eq!(params.len(), table.n_active() * rule.n_points());

        for (node, group) in table.active().iter().zip(params.chunks(rule.n_points())) {
            assert!(group.iter().all(|p| p.bin_id == node.bin_id));
            assert!(group[0].is_centre());
            assert!(group.iter().all(|p| p.abscissa_minus >= node.lower));
            assert!(group.iter().all(|p| p.abscissa_plus <= node.upper));
            assert!(group.iter().all(|p| p.jacobian == node.width() / 2.0));
            for (i, p) in group.iter().enumerate() {
                assert_eq!(p.kronrod_weight, rule.kronrod_weight(i));
            }
        }
    }

    #[test]
    fn test_executors_expand_identically() {
        let rule = GaussKronrodRule::default();
        let table = NodeTable::init(-2.0, 3.0, 40);
        let seq = expand_parameters(&Sequential, &rule, table.active());
        let par = expand_parameters(&Threaded::new(), &rule, table.active());
        assert_eq!(seq, par);
    }

    #[test]
    fn test_columns_mirror_records() {
        let rule = GaussKronrodRule::default();
        let table = NodeTable::init(0.0, 1.0, 2);
        let params = expand_parameters(&Sequential, &rule, table.active());
        let columns = ParameterColumns::from_records(&params);
        assert_eq!(columns.len(), params.len());
        assert_eq!(columns.abscissa_plus[9], params[9].abscissa_plus);
        assert_eq!(columns.bin_ids[rule.n_points()], 1);
        assert!(ParameterColumns::from_records(&[]).is_empty());
    }
}
