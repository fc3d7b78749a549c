
use rstest::*;
use ds_testutils::*;

use super::*;
