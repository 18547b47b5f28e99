/*!
# I/O Utilities for Saving Chains to CSV

This module provides a function to save a chain to a CSV file. Enable via the `csv` feature.
*/

use ndarray::{ArrayView2, Axis};
use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::error::Result;

/**
Saves a chain as a CSV file.

The data is expected to be in a shape of **step × dimension**, as in
[`MHRun::sample`](crate::metropolis_hastings::MHRun::sample).

The resulting CSV file will have:
- A header row containing `"step"` and one column per dimension named `"dim_0"`, `"dim_1"`, etc.
- One row per chain state, row 0 being the initial state.

# Examples

```rust
use mini_metropolis::io::csv::save_csv;
use ndarray::arr2;

let chain = arr2(&[[9.234, 0.567], [4.1, 5.9]]);
let path = std::env::temp_dir().join("mini_metropolis_doc.csv");
save_csv(chain.view(), &path)?;
# Ok::<(), mini_metropolis::error::MhError>(())
```
*/
pub fn save_csv<T: std::fmt::Display, P: AsRef<Path>>(data: ArrayView2<T>, filename: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    let n_dims = data.ncols();

    let mut header: Vec<String> = vec!["step".to_string()];
    header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    wtr.write_record(&header)?;

    for (step, state) in data.axis_iter(Axis(0)).enumerate() {
        let mut row = vec![step.to_string()];
        row.extend(state.iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
