use crate::error::{PmfError, PmfResult};
use crate::models::{Entity, EpochLosses, Rating, Split};

pub fn validate_entity_id(entity: Entity, id: usize, limit: usize) -> PmfResult<()> {
    if id >= limit {
        return Err(PmfError::IndexOutOfRange { entity, id, limit });
    }
    Ok(())
}

pub fn validate_entity_ids(entity: Entity, ids: &[usize], limit: usize) -> PmfResult<()> {
    for &id in ids {
        validate_entity_id(entity, id, limit)?;
    }
    Ok(())
}

/// Checks every row of a split against the allocated factor rows.
/// Returns the number of ratings that fall below the bottom of the `[1, K]` scale.
pub fn validate_ratings(
    ratings: &[Rating],
    split: Split,
    user_rows: usize,
    product_rows: usize,
) -> PmfResult<usize> {
    if ratings.is_empty() {
        return Err(PmfError::EmptyDataset(split));
    }

    let mut below_scale = 0;
    for (row, rating) in ratings.iter().enumerate() {
        validate_entity_id(Entity::User, rating.user, user_rows)?;
        validate_entity_id(Entity::Product, rating.product, product_rows)?;

        if !rating.rating.is_finite() {
            return Err(PmfError::InvalidRating {
                split,
                row,
                value: rating.rating,
            });
        }

        if rating.rating < 1.0 {
            below_scale += 1;
        }
    }

    Ok(below_scale)
}

pub fn validate_shape(expected: (usize, usize), got: (usize, usize)) -> PmfResult<()> {
    if expected != got {
        return Err(PmfError::shape_mismatch(
            format!("{}x{}", expected.0, expected.1),
            format!("{}x{}", got.0, got.1),
        ));
    }
    Ok(())
}

pub fn validate_epoch_losses(losses: &EpochLosses) -> PmfResult<()> {
    if !losses.is_finite() {
        return Err(PmfError::NumericInstability {
            epoch: losses.epoch,
            train_rmse: losses.train_rmse,
            test_rmse: losses.test_rmse,
        });
    }
    Ok(())
}
