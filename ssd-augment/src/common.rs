pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, Transform, HW, TLBR};
pub use itertools::Itertools as _;
pub use label::Label;
pub use ndarray::{s, Array2, Array3, ArrayView3, Axis, Zip};
pub use noisy_float::prelude::*;
pub use rand::prelude::*;
pub use serde::{
    de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
};
pub use std::{
    fmt::Debug,
    num::NonZeroUsize,
    path::Path,
    str::FromStr,
};
pub use tracing::{debug, instrument, trace};

/// A class-labeled box in normalized `(ymin, xmin, ymax, xmax)` coordinates.
pub type RatioLabel = Label<TLBR<f64>, i64>;
