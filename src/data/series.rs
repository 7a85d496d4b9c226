//! Series Model
//! Columnar, order-keyed storage for sampled function/derivative pairs.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("sample carries {found} value/derivative pairs, expected {expected}")]
    OrderMismatch { expected: usize, found: usize },
}

/// One input row: an abscissa plus one `(value, derivative)` pair per order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub pairs: Vec<(f64, f64)>,
}

impl Sample {
    pub fn new(x: f64, pairs: Vec<(f64, f64)>) -> Self {
        Self { x, pairs }
    }
}

/// Function values and derivatives of a single order `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSeries {
    order: usize,
    values: Vec<f64>,
    derivatives: Vec<f64>,
}

impl OrderSeries {
    fn with_capacity(order: usize, capacity: usize) -> Self {
        Self {
            order,
            values: Vec::with_capacity(capacity),
            derivatives: Vec::with_capacity(capacity),
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn derivatives(&self) -> &[f64] {
        &self.derivatives
    }
}

/// The loaded dataset in columnar form.
///
/// Every series has the same length as `x`, and every order `0..K` is
/// present. Instances are only produced by [`SeriesSetBuilder`], so the
/// invariant holds for the whole lifetime of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    x: Vec<f64>,
    orders: Vec<OrderSeries>,
}

impl SeriesSet {
    /// Largest order count a dataset may carry.
    pub const MAX_ORDERS: usize = 1024;

    /// Number of delimited fields a row must carry for `orders` orders, or
    /// `None` above [`SeriesSet::MAX_ORDERS`].
    pub fn field_count(orders: usize) -> Option<usize> {
        if orders > Self::MAX_ORDERS {
            return None;
        }
        orders.checked_mul(2)?.checked_add(1)
    }

    /// A dataset with `orders` empty series.
    pub fn empty(orders: usize) -> Self {
        SeriesSetBuilder::new(orders).build()
    }

    /// Build from an in-memory sequence of samples, keeping their order.
    pub fn from_samples<I>(orders: usize, samples: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut builder = SeriesSetBuilder::new(orders);
        for sample in samples {
            builder.push(&sample)?;
        }
        Ok(builder.build())
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The order count `K`.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn orders(&self) -> &[OrderSeries] {
        &self.orders
    }

    pub fn order(&self, k: usize) -> Option<&OrderSeries> {
        self.orders.get(k)
    }

    pub fn values(&self, k: usize) -> Option<&[f64]> {
        self.order(k).map(OrderSeries::values)
    }

    pub fn derivatives(&self, k: usize) -> Option<&[f64]> {
        self.order(k).map(OrderSeries::derivatives)
    }
}

/// Accumulates samples row by row; the only way to obtain a [`SeriesSet`].
#[derive(Debug)]
pub struct SeriesSetBuilder {
    set: SeriesSet,
}

impl SeriesSetBuilder {
    pub fn new(orders: usize) -> Self {
        Self::with_capacity(orders, 0)
    }

    pub fn with_capacity(orders: usize, rows: usize) -> Self {
        Self {
            set: SeriesSet {
                x: Vec::with_capacity(rows),
                orders: (0..orders)
                    .map(|k| OrderSeries::with_capacity(k, rows))
                    .collect(),
            },
        }
    }

    /// Append one sample. Rejects samples whose pair count differs from `K`.
    pub fn push(&mut self, sample: &Sample) -> Result<(), SeriesError> {
        let expected = self.set.orders.len();
        if sample.pairs.len() != expected {
            return Err(SeriesError::OrderMismatch {
                expected,
                found: sample.pairs.len(),
            });
        }

        self.push_row(sample);
        Ok(())
    }

    /// Append a sample whose pair count is already known to be `K`.
    pub(crate) fn push_row(&mut self, sample: &Sample) {
        debug_assert_eq!(sample.pairs.len(), self.set.orders.len());

        self.set.x.push(sample.x);
        for (series, &(value, derivative)) in self.set.orders.iter_mut().zip(&sample.pairs) {
            series.values.push(value);
            series.derivatives.push(derivative);
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn build(self) -> SeriesSet {
        self.set
    }
}
