//! Index access with one-based subscripts.
//!
//! The surface language counts from 1; matrix and string storage counts from
//! 0. The conversion happens here and nowhere else. Reads return a fresh
//! value; writes are functional and return the updated container.
//!
//! Selector kinds decide the result shape: a plain number selects a single
//! element, a range or vector gathers a matrix, even when it holds a single
//! index.

use mathex_builtins::{Matrix, Value};

enum Selector {
    One(usize),
    Many(Vec<usize>),
}

impl Selector {
    fn indices(&self) -> Vec<usize> {
        match self {
            Selector::One(i) => vec![*i],
            Selector::Many(is) => is.clone(),
        }
    }
}

fn position(x: f64, extent: usize) -> Result<usize, String> {
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(format!("index must be an integer, got {x}"));
    }
    if x < 1.0 || x > extent as f64 {
        return Err(format!("index {x} out of range (1 to {extent})"));
    }
    Ok(x as usize - 1)
}

fn resolve(selector: &Value, extent: usize) -> Result<Selector, String> {
    match selector {
        Value::Num(n) => Ok(Selector::One(position(*n, extent)?)),
        Value::Range(r) => {
            let indices = r
                .values()
                .into_iter()
                .map(|x| position(x, extent))
                .collect::<Result<Vec<usize>, String>>()?;
            Ok(Selector::Many(indices))
        }
        Value::Matrix(m) => {
            let indices = m
                .data
                .iter()
                .map(|x| position(*x, extent))
                .collect::<Result<Vec<usize>, String>>()?;
            Ok(Selector::Many(indices))
        }
        other => Err(format!("invalid index: {other:?}")),
    }
}

/// Read `target[selectors...]`.
pub fn index_get(target: &Value, selectors: &[Value]) -> Result<Value, String> {
    if selectors.is_empty() {
        return Err("at least one index is required".to_string());
    }
    match target {
        Value::Object(map) => {
            let name = object_key(selectors)?;
            map.get(name)
                .cloned()
                .ok_or_else(|| format!("undefined property `{name}`"))
        }
        Value::Str(s) => {
            if selectors.len() != 1 {
                return Err("strings take a single index".to_string());
            }
            let chars: Vec<char> = s.chars().collect();
            match resolve(&selectors[0], chars.len())? {
                Selector::One(i) => Ok(Value::Str(chars[i].to_string())),
                Selector::Many(is) => Ok(Value::Str(is.iter().map(|i| chars[*i]).collect())),
            }
        }
        Value::Matrix(m) => matrix_get(m, selectors),
        Value::Range(r) => matrix_get(&r.to_matrix(), selectors),
        other => Err(format!("cannot index {other:?}")),
    }
}

fn matrix_get(m: &Matrix, selectors: &[Value]) -> Result<Value, String> {
    match selectors {
        [linear] => match resolve(linear, m.data.len())? {
            Selector::One(i) => Ok(Value::Num(m.data[i])),
            Selector::Many(is) => Ok(Value::Matrix(Matrix::row_vector(
                is.iter().map(|i| m.data[*i]).collect(),
            ))),
        },
        [row, col] => {
            let rows = resolve(row, m.rows)?;
            let cols = resolve(col, m.cols)?;
            if let (Selector::One(i), Selector::One(j)) = (&rows, &cols) {
                return Ok(Value::Num(m.data[i * m.cols + j]));
            }
            let row_idx = rows.indices();
            let col_idx = cols.indices();
            let mut data = Vec::with_capacity(row_idx.len() * col_idx.len());
            for i in &row_idx {
                for j in &col_idx {
                    data.push(m.data[i * m.cols + j]);
                }
            }
            Ok(Value::Matrix(Matrix::new(
                data,
                row_idx.len(),
                col_idx.len(),
            )?))
        }
        _ => Err(format!(
            "matrices support 1 or 2 subscripts, got {}",
            selectors.len()
        )),
    }
}

/// Write `target[selectors...] = replacement`, returning the updated value.
pub fn index_set(
    target: &Value,
    selectors: &[Value],
    replacement: &Value,
) -> Result<Value, String> {
    if selectors.is_empty() {
        return Err("at least one index is required".to_string());
    }
    match target {
        Value::Object(map) => {
            let name = object_key(selectors)?;
            let mut updated = map.clone();
            updated.insert(name.to_string(), replacement.clone());
            Ok(Value::Object(updated))
        }
        Value::Str(s) => {
            if selectors.len() != 1 {
                return Err("strings take a single index".to_string());
            }
            let mut chars: Vec<char> = s.chars().collect();
            let indices = resolve(&selectors[0], chars.len())?.indices();
            let text = match replacement {
                Value::Str(t) => t,
                other => return Err(format!("string replacement must be a string, got {other:?}")),
            };
            let replacement_chars: Vec<char> = text.chars().collect();
            if replacement_chars.len() != indices.len() {
                return Err(format!(
                    "replacement length {} does not match selection length {}",
                    replacement_chars.len(),
                    indices.len()
                ));
            }
            for (i, c) in indices.into_iter().zip(replacement_chars) {
                chars[i] = c;
            }
            Ok(Value::Str(chars.into_iter().collect()))
        }
        Value::Matrix(m) => matrix_set(m, selectors, replacement),
        Value::Range(r) => matrix_set(&r.to_matrix(), selectors, replacement),
        other => Err(format!("cannot index {other:?}")),
    }
}

fn matrix_set(m: &Matrix, selectors: &[Value], replacement: &Value) -> Result<Value, String> {
    let mut updated = m.clone();
    match selectors {
        [linear] => {
            let indices = resolve(linear, m.data.len())?.indices();
            let fill = replacement_values(replacement, indices.len())?;
            for (i, v) in indices.into_iter().zip(fill) {
                updated.data[i] = v;
            }
        }
        [row, col] => {
            let row_idx = resolve(row, m.rows)?.indices();
            let col_idx = resolve(col, m.cols)?.indices();
            let positions: Vec<usize> = row_idx
                .iter()
                .flat_map(|i| col_idx.iter().map(move |j| i * m.cols + j))
                .collect();
            let fill = replacement_values(replacement, positions.len())?;
            for (p, v) in positions.into_iter().zip(fill) {
                updated.data[p] = v;
            }
        }
        _ => {
            return Err(format!(
                "matrices support 1 or 2 subscripts, got {}",
                selectors.len()
            ))
        }
    }
    Ok(Value::Matrix(updated))
}

/// Scalars broadcast over the whole selection; matrix replacements must match
/// the selection size exactly and are consumed row-major.
fn replacement_values(replacement: &Value, count: usize) -> Result<Vec<f64>, String> {
    match replacement {
        Value::Num(x) => Ok(vec![*x; count]),
        Value::Bool(b) => Ok(vec![if *b { 1.0 } else { 0.0 }; count]),
        Value::Matrix(m) => {
            if m.data.len() != count {
                return Err(format!(
                    "replacement length {} does not match selection length {count}",
                    m.data.len()
                ));
            }
            Ok(m.data.clone())
        }
        Value::Range(r) => replacement_values(&Value::Matrix(r.to_matrix()), count),
        other => Err(format!("cannot assign {other:?} into a matrix")),
    }
}

fn object_key(selectors: &[Value]) -> Result<&str, String> {
    match selectors {
        [Value::Str(name)] => Ok(name),
        [other] => Err(format!("object access takes a property name, got {other:?}")),
        _ => Err("object access takes a single property name".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathex_builtins::RangeValue;
    use std::collections::HashMap;

    fn sample() -> Matrix {
        Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap()
    }

    #[test]
    fn scalar_subscripts_select_elements() {
        let m = Value::Matrix(sample());
        assert_eq!(index_get(&m, &[Value::Num(1.0), Value::Num(1.0)]).unwrap(), Value::Num(1.0));
        assert_eq!(index_get(&m, &[Value::Num(2.0), Value::Num(3.0)]).unwrap(), Value::Num(6.0));
        assert_eq!(index_get(&m, &[Value::Num(4.0)]).unwrap(), Value::Num(4.0));
    }

    #[test]
    fn range_subscripts_gather_matrices() {
        let m = Value::Matrix(sample());
        let cols = RangeValue::new(2.0, 1.0, 3.0).unwrap();
        let sub = index_get(&m, &[Value::Num(1.0), Value::Range(cols)]).unwrap();
        match sub {
            Value::Matrix(s) => {
                assert_eq!((s.rows, s.cols), (1, 2));
                assert_eq!(s.data, vec![2.0, 3.0]);
            }
            other => panic!("expected matrix, got {other:?}"),
        }

        let single = RangeValue::new(2.0, 1.0, 2.0).unwrap();
        let kept = index_get(&m, &[Value::Range(single)]).unwrap();
        assert!(matches!(kept, Value::Matrix(_)));
    }

    #[test]
    fn bounds_and_integrality_are_enforced() {
        let m = Value::Matrix(sample());
        assert!(index_get(&m, &[Value::Num(0.0)]).is_err());
        assert!(index_get(&m, &[Value::Num(7.0)]).is_err());
        assert!(index_get(&m, &[Value::Num(1.5)]).is_err());
        assert!(index_get(&m, &[Value::Num(3.0), Value::Num(1.0)]).is_err());
        assert!(index_get(&m, &[Value::Num(1.0), Value::Num(1.0), Value::Num(1.0)]).is_err());
    }

    #[test]
    fn writes_are_functional() {
        let m = Value::Matrix(sample());
        let updated = index_set(&m, &[Value::Num(1.0), Value::Num(2.0)], &Value::Num(20.0)).unwrap();
        match &updated {
            Value::Matrix(u) => assert_eq!(u.data, vec![1.0, 20.0, 3.0, 4.0, 5.0, 6.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
        match &m {
            Value::Matrix(orig) => assert_eq!(orig.data[1], 2.0),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn scalar_replacement_broadcasts() {
        let m = Value::Matrix(sample());
        let rows = RangeValue::new(1.0, 1.0, 2.0).unwrap();
        let updated = index_set(
            &m,
            &[Value::Range(rows), Value::Num(1.0)],
            &Value::Num(0.0),
        )
        .unwrap();
        match updated {
            Value::Matrix(u) => assert_eq!(u.data, vec![0.0, 2.0, 3.0, 0.0, 5.0, 6.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn matrix_replacement_must_match_selection() {
        let m = Value::Matrix(sample());
        let cols = RangeValue::new(1.0, 1.0, 3.0).unwrap();
        let wrong = Matrix::row_vector(vec![9.0, 9.0]);
        assert!(index_set(
            &m,
            &[Value::Num(1.0), Value::Range(cols.clone())],
            &Value::Matrix(wrong)
        )
        .is_err());

        let right = Matrix::row_vector(vec![9.0, 8.0, 7.0]);
        let updated = index_set(
            &m,
            &[Value::Num(1.0), Value::Range(cols)],
            &Value::Matrix(right),
        )
        .unwrap();
        match updated {
            Value::Matrix(u) => assert_eq!(u.data, vec![9.0, 8.0, 7.0, 4.0, 5.0, 6.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn object_member_access() {
        let mut fields = HashMap::new();
        fields.insert("radius".to_string(), Value::Num(2.0));
        let obj = Value::Object(fields);
        assert_eq!(
            index_get(&obj, &[Value::Str("radius".into())]).unwrap(),
            Value::Num(2.0)
        );
        assert!(index_get(&obj, &[Value::Str("missing".into())]).is_err());

        let updated = index_set(&obj, &[Value::Str("area".into())], &Value::Num(12.57)).unwrap();
        assert_eq!(
            index_get(&updated, &[Value::Str("area".into())]).unwrap(),
            Value::Num(12.57)
        );
    }

    #[test]
    fn string_indexing() {
        let s = Value::Str("hello".into());
        assert_eq!(index_get(&s, &[Value::Num(1.0)]).unwrap(), Value::Str("h".into()));
        let r = RangeValue::new(2.0, 1.0, 4.0).unwrap();
        assert_eq!(
            index_get(&s, &[Value::Range(r.clone())]).unwrap(),
            Value::Str("ell".into())
        );
        let replaced = index_set(&s, &[Value::Range(r)], &Value::Str("ipp".into())).unwrap();
        assert_eq!(replaced, Value::Str("hippo".into()));
        assert!(index_set(&s, &[Value::Num(1.0)], &Value::Str("xy".into())).is_err());
    }

    #[test]
    fn ranges_index_like_row_vectors() {
        let r = Value::Range(RangeValue::new(10.0, 10.0, 50.0).unwrap());
        assert_eq!(index_get(&r, &[Value::Num(3.0)]).unwrap(), Value::Num(30.0));
    }
}
