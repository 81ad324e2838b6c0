macro_rules! each_capacity {
  ($expr:expr) => {
    #[cfg(any(coverage, coverage_nightly, miri))]
    {
      $crate::utils::each_capacity!(
        @impl $expr,
        3, 4, 64,
      );
    }

    #[cfg(not(any(coverage, coverage_nightly, miri)))]
    {
      $crate::utils::each_capacity!(
        @impl $expr,
        3, 4, 5, 7, 8, 16, 31, 64, 100, 256, 1024,
      );
    }
  };
  (@impl $expr:expr, $($size:expr),+ $(,)?) => {
    $(
      $crate::utils::each_capacity!(@run $expr, $size);
    )+
  };
  (@run $expr:expr, $size:expr) => {{
    const S: usize = $size;
    $expr
  }};
}

pub(crate) use each_capacity;
