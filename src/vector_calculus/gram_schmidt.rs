//! Gram-Schmidt orthogonalisation of symbolic vectors:
//! `w_k = v_k - sum_j (v_k . u_j / u_j . u_j) u_j`, optionally `u_k = w_k / |w_k|`.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::trace::DerivationTrace;
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub struct GramSchmidtResult {
    pub basis: Vec<ExprVector>,
    pub trace: DerivationTrace,
}

pub fn gram_schmidt(vectors: &[ExprVector], normalize: bool) -> Result<GramSchmidtResult, CalcError> {
    let Some(first) = vectors.first() else {
        return Err(CalcError::InvalidInput("no vectors given".to_string()));
    };
    if let Some(bad) = vectors.iter().position(|v| v.len() != first.len()) {
        return Err(CalcError::InvalidInput(format!(
            "v{} has {} components, v1 has {}",
            bad + 1,
            vectors[bad].len(),
            first.len()
        )));
    }
    info!("Gram-Schmidt on {} vectors of dimension {}", vectors.len(), first.len());

    let mut trace = DerivationTrace::new();
    for (k, v) in vectors.iter().enumerate() {
        trace.push_vector(&format!("v{}", k + 1), v);
    }

    let mut basis: Vec<ExprVector> = Vec::with_capacity(vectors.len());
    for (k, v) in vectors.iter().enumerate() {
        let mut w = v.simplify();
        for (j, u) in basis.iter().enumerate() {
            let coefficient = (v.dot(u).map_err(CalcError::InvalidInput)? / u.norm_squared()).simplify();
            trace.push_expression(&format!("(v{} . u{}) / (u{} . u{})", k + 1, j + 1, j + 1, j + 1), &coefficient);
            if !coefficient.simplifies_to_zero() {
                w = w.try_sub(&u.scale(&coefficient)).map_err(CalcError::InvalidInput)?;
            }
        }
        if w.is_zero() {
            return Err(CalcError::LinearlyDependent { index: k });
        }
        trace.push_vector(&format!("w{}", k + 1), &w);
        let u = if normalize {
            let norm = w.norm_squared().sqrt().simplify();
            let u = w.scale(&(Expr::Const(1.0) / norm));
            trace.push_vector(&format!("u{} = w{}/|w{}|", k + 1, k + 1, k + 1), &u);
            u
        } else {
            w
        };
        basis.push(u);
    }
    Ok(GramSchmidtResult { basis, trace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vector(components: &[&str]) -> ExprVector {
        ExprVector::new(
            components
                .iter()
                .map(|c| Expr::parse_expression(c).unwrap())
                .collect(),
        )
    }

    fn numeric(v: &ExprVector) -> Vec<f64> {
        v.evaluate(&[], &[])
    }

    #[test]
    fn test_orthogonal_basis() {
        let vs = [vector(&["1", "1", "0"]), vector(&["1", "0", "1"]), vector(&["0", "1", "1"])];
        let res = gram_schmidt(&vs, false).unwrap();
        assert_eq!(res.basis[0], vs[0]);
        assert_eq!(numeric(&res.basis[1]), vec![0.5, -0.5, 1.0]);
        for i in 0..3 {
            for j in (i + 1)..3 {
                assert!(res.basis[i].dot(&res.basis[j]).unwrap().simplifies_to_zero());
            }
        }
    }

    #[test]
    fn test_orthonormal_basis() {
        let vs = [vector(&["3", "4"]), vector(&["1", "0"])];
        let res = gram_schmidt(&vs, true).unwrap();
        let u1 = numeric(&res.basis[0]);
        assert_relative_eq!(u1[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(u1[1], 0.8, epsilon = 1e-12);
        let u2 = numeric(&res.basis[1]);
        assert_relative_eq!(u2[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(u2[1], -0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_symbolic_entries() {
        // (1, t) and (-t, 1) are already orthogonal for every t
        let vs = [vector(&["1", "t"]), vector(&["-t", "1"])];
        let res = gram_schmidt(&vs, false).unwrap();
        assert_eq!(res.basis[1], vs[1].simplify());
    }

    #[test]
    fn test_dependent_vectors() {
        let vs = [vector(&["1", "2", "3"]), vector(&["2", "4", "6"])];
        assert_eq!(
            gram_schmidt(&vs, true),
            Err(CalcError::LinearlyDependent { index: 1 })
        );
        let mismatched = [vector(&["1", "2"]), vector(&["1", "2", "3"])];
        assert!(matches!(gram_schmidt(&mismatched, false), Err(CalcError::InvalidInput(_))));
        assert!(matches!(gram_schmidt(&[], false), Err(CalcError::InvalidInput(_))));
    }
}
