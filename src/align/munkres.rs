//! Hungarian (Kuhn-Munkres) optimal assignment.
//!
//! The assignment engine minimizes cost over a square matrix using the
//! potentials + shortest-augmenting-path formulation, O(n³) in the larger
//! dimension and O(n²) memory. [`assign_max`] is the similarity-facing
//! wrapper used by the aligners: it pads the matrix to square with zero
//! similarity, applies the order-reversing transform
//! `cost = max_similarity − similarity`, and returns the chosen pairs for
//! the original (unpadded) dimensions.
//!
//! The algorithm always returns a complete matching, including pairs whose
//! true similarity is 0 (padding, or genuinely unalignable rows). Callers
//! filter those out when recording an [`Alignment`](crate::align::Alignment):
//! optimize first, then filter.

/// Solve the minimum-cost assignment for a square cost matrix.
///
/// Returns `assignment[row] = col`. The matrix must be square and every
/// cost finite; both hold by construction in [`assign_max`].
#[must_use]
pub fn minimize(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    if n == 0 {
        return Vec::new();
    }
    debug_assert!(cost.iter().all(|row| row.len() == n));

    // 1-based potentials; p[j] is the row matched to column j (0 = none).
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut p = vec![0_usize; n + 1];
    let mut way = vec![0_usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0_usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0_usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        // Augment along the found path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0_usize; n];
    for j in 1..=n {
        if p[j] > 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    assignment
}

/// Maximum-similarity one-to-one assignment over a rectangular matrix.
///
/// `similarity[row][col]` must be non-negative. The matrix is padded to
/// square with zeros, converted to costs, and solved exactly. Returned
/// pairs cover only the original dimensions; pairs may still carry zero
/// similarity and are filtered by the caller.
#[must_use]
pub fn assign_max(similarity: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let rows = similarity.len();
    let cols = similarity.iter().map(Vec::len).max().unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let n = rows.max(cols);

    let max_sim = similarity
        .iter()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);

    let cost: Vec<Vec<f64>> = (0..n)
        .map(|r| {
            (0..n)
                .map(|c| {
                    let sim = similarity
                        .get(r)
                        .and_then(|row| row.get(c))
                        .copied()
                        .unwrap_or(0.0);
                    max_sim - sim
                })
                .collect()
        })
        .collect();

    minimize(&cost)
        .into_iter()
        .enumerate()
        .filter(|&(r, c)| r < rows && c < cols)
        .collect()
}
