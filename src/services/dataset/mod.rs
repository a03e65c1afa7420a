use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::error::{PmfError, PmfResult};
use crate::models::{Rating, Split};

/// Loads `user, product, rating` rows from a delimited text file.
/// Columns after the third (e.g. timestamps) are ignored.
pub fn load_ratings(path: impl AsRef<Path>, config: &DataConfig) -> PmfResult<Vec<Rating>> {
    let path = path.as_ref();
    let ratings = read_ratings(File::open(path)?, config)?;
    info!("Loaded {} ratings from {}", ratings.len(), path.display());
    Ok(ratings)
}

pub fn read_ratings<R: Read>(reader: R, config: &DataConfig) -> PmfResult<Vec<Rating>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .has_headers(config.has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut ratings = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        ratings.push(parse_record(&record)?);
    }

    Ok(ratings)
}

fn parse_record(record: &StringRecord) -> PmfResult<Rating> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let field = |index: usize, name: &str| {
        record
            .get(index)
            .ok_or_else(|| PmfError::parse(line, format!("missing {} column", name)))
    };

    let user = field(0, "user")?
        .parse::<usize>()
        .map_err(|e| PmfError::parse(line, format!("user id: {}", e)))?;
    let product = field(1, "product")?
        .parse::<usize>()
        .map_err(|e| PmfError::parse(line, format!("product id: {}", e)))?;
    let rating = field(2, "rating")?
        .parse::<f64>()
        .map_err(|e| PmfError::parse(line, format!("rating: {}", e)))?;

    Ok(Rating::new(user, product, rating))
}

/// Random holdout of `test_fraction` of the rows. Both sides get at least one row.
pub fn train_test_split<R: Rng + ?Sized>(
    ratings: &[Rating],
    test_fraction: f64,
    rng: &mut R,
) -> PmfResult<(Vec<Rating>, Vec<Rating>)> {
    if ratings.len() < 2 {
        return Err(PmfError::EmptyDataset(Split::Test));
    }

    let mut shuffled = ratings.to_vec();
    shuffled.shuffle(rng);

    let test_len = ((ratings.len() as f64) * test_fraction).round() as usize;
    let test_len = test_len.clamp(1, ratings.len() - 1);
    let train = shuffled.split_off(test_len);
    debug!("Split {} ratings into {} train / {} test", ratings.len(), train.len(), test_len);

    Ok((train, shuffled))
}
