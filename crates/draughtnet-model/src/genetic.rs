//! Pure weight-vector operators for population search.
//!
//! All three operators produce fresh vectors and never touch their inputs.
//! Determinism is the caller's concern: thread a seeded generator through to
//! reproduce a run, or an OS-seeded one for exploration.

use rand::Rng;

use crate::ModelError;

/// Builds a vector by applying a function to each index.
fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Samples a fresh weight vector, each value uniform in
/// `[-spread / 2, spread / 2]`.
pub fn create_new<R>(rng: &mut R, size: usize, spread: f32) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-spread / 2.0..=spread / 2.0), size)
}

/// Element-wise crossover: each position independently takes `b`'s value
/// with probability `prob`, otherwise `a`'s.
///
/// The parents must have equal length.
pub fn crossover<R>(rng: &mut R, a: &[f32], b: &[f32], prob: f32) -> Result<Vec<f32>, ModelError>
where
    R: Rng + ?Sized,
{
    if a.len() != b.len() {
        return Err(ModelError::ShapeMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(from_fn(
        |i| {
            if rng.random_bool(f64::from(prob)) {
                b[i]
            } else {
                a[i]
            }
        },
        a.len(),
    ))
}

/// Element-wise mutation: each position is independently perturbed by a
/// uniform sample in `[-delta / 2, delta / 2]` with probability `prob`,
/// otherwise copied unchanged.
pub fn mutate<R>(rng: &mut R, v: &[f32], prob: f32, delta: f32) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(
        |i| {
            if rng.random_bool(f64::from(prob)) {
                v[i] + rng.random_range(-delta / 2.0..=delta / 2.0)
            } else {
                v[i]
            }
        },
        v.len(),
    )
}
