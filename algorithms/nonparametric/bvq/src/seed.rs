use riskvq_helpers::{DataSource, Float};

use crate::{BvqError, CodeVector};

/// `n` code vectors copied from points drawn with replacement from `source`,
/// ignoring class balance. The source is reset afterwards.
pub fn random_code_vectors<F: Float, D: DataSource<F>>(
    source: &mut D,
    n: usize,
) -> Result<Vec<CodeVector<F>>, BvqError> {
    let code_vectors = (0..n)
        .map(|_| source.draw(false).map(CodeVector::new))
        .collect::<Result<_, _>>()?;
    source.reset();
    Ok(code_vectors)
}
