use crate::engine::Brain;
use crate::error::ConfigError;
use crate::expectimax::{self, Expectimax, ExpectimaxConfig, MovePolicy};
use crate::grid::{Grid, GridSnapshot};
use wasm_bindgen::prelude::*;

/// Browser-facing agent. Boards come in as the game's serialized grid JSON,
/// moves go out as direction codes (0 up, 1 right, 2 down, 3 left).
#[wasm_bindgen]
pub struct WasmAgent {
    search: Expectimax,
}

#[wasm_bindgen]
impl WasmAgent {
    #[wasm_bindgen(constructor)]
    pub fn new(depth: Option<u32>) -> Result<WasmAgent, JsValue> {
        let config = config_for_depth(depth).map_err(to_js_error)?;
        Ok(WasmAgent {
            search: Expectimax::with_config(config),
        })
    }

    /// Best direction code, or -1 when no move changes the board.
    pub fn select_move(&self, snapshot_json: &str) -> Result<i32, JsValue> {
        let grid = parse_grid(snapshot_json)?;
        Ok(match self.search.select_move(&grid) {
            Some(direction) => direction.code() as i32,
            None => -1,
        })
    }

    pub fn legal_moves(&self, snapshot_json: &str) -> Result<Vec<u8>, JsValue> {
        let grid = parse_grid(snapshot_json)?;
        Ok(expectimax::legal_moves(&Brain::from_grid(&grid))
            .into_iter()
            .map(|direction| direction.code())
            .collect())
    }
}

fn config_for_depth(depth: Option<u32>) -> Result<ExpectimaxConfig, ConfigError> {
    let mut config = ExpectimaxConfig::default();
    if let Some(depth) = depth {
        config.depth = depth;
    }
    config.validate()?;
    Ok(config)
}

fn parse_grid(snapshot_json: &str) -> Result<Grid, JsValue> {
    let snapshot = GridSnapshot::from_json(snapshot_json).map_err(to_js_error)?;
    Ok(Grid::from_snapshot(&snapshot))
}

fn to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::{DEFAULT_DEPTH, MAX_DEPTH};

    const STUCK: &str = r#"{"size":2,"cells":[[{"value":2},{"value":4}],[{"value":4},{"value":2}]]}"#;
    const OPEN: &str = r#"{"size":2,"cells":[[{"value":2},null],[null,null]]}"#;

    #[test]
    fn it_returns_minus_one_when_stuck() {
        let agent = WasmAgent::new(Some(2)).unwrap();
        assert_eq!(agent.select_move(STUCK).unwrap(), -1);
        assert!(agent.legal_moves(STUCK).unwrap().is_empty());
    }

    #[test]
    fn it_returns_a_legal_code() {
        let agent = WasmAgent::new(None).unwrap();
        let code = agent.select_move(OPEN).unwrap();
        assert!(code == 1 || code == 2, "unexpected code {}", code);
    }

    #[test]
    fn it_lists_legal_codes_in_order() {
        let agent = WasmAgent::new(Some(1)).unwrap();
        assert_eq!(agent.legal_moves(OPEN).unwrap(), vec![1, 2]);
    }

    #[test]
    fn it_checks_requested_depth() {
        assert_eq!(config_for_depth(None).unwrap().depth, DEFAULT_DEPTH);
        assert_eq!(config_for_depth(Some(3)).unwrap().depth, 3);
        assert!(config_for_depth(Some(MAX_DEPTH + 1)).is_err());
    }
}
