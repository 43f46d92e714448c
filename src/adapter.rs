//! JSON request/response contract for serving the solver over HTTP.
//!
//! The transport itself is left to the embedding server: it hands over the
//! request method and body and writes back the returned status code and JSON
//! body.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::SolverConfig;
use crate::error::Error;
use crate::method::Method;
use crate::problem::{ObjectiveDirection, Problem, Relation, Solution, Status};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub objective: Vec<f64>,
    pub constraints: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    /// Defaults to `<=` for every row.
    #[serde(default)]
    pub relations: Option<Vec<Relation>>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default)]
    pub sense: Option<ObjectiveDirection>,
}

impl SolveRequest {
    pub fn into_problem(self) -> Result<Problem, Error> {
        let direction = self.sense.unwrap_or_default();
        let problem = Problem::new(self.objective, self.constraints, self.rhs, self.relations)?;
        Ok(problem.with_direction(direction))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_value: Option<f64>,
    /// `x1`..`xn` in index order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    pub iterations: usize,
    pub method: Method,
}

impl SolveResponse {
    pub fn new(solution: &Solution, method: Method) -> SolveResponse {
        let variables = solution.variables().map(|x| {
            x.iter()
                .enumerate()
                .map(|(i, &v)| (format!("x{}", i + 1), json!(v)))
                .collect()
        });
        SolveResponse {
            status: solution.status(),
            optimal_value: solution.optimal_value(),
            variables,
            iterations: solution.iterations,
            method,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub body: Value,
}

impl Response {
    fn ok(body: Value) -> Response {
        Response { status_code: 200, body }
    }

    fn error(status_code: u16, message: String) -> Response {
        Response {
            status_code,
            body: json!({ "error": message }),
        }
    }
}

/// Turns requests into solver calls. Values named by a request take
/// precedence over the handler's defaults.
#[derive(Debug, Clone, Default)]
pub struct Handler {
    config: SolverConfig,
    default_method: Method,
}

impl Handler {
    pub fn new(config: SolverConfig) -> Handler {
        Handler {
            config,
            default_method: Method::default(),
        }
    }

    pub fn with_default_method(mut self, method: Method) -> Handler {
        self.default_method = method;
        self
    }

    pub fn solve(&self, request: SolveRequest) -> Result<SolveResponse, Error> {
        let method = request.method.unwrap_or(self.default_method);
        let mut config = self.config;
        if let Some(max_iterations) = request.max_iterations {
            config.max_iterations = max_iterations;
        }
        let problem = request.into_problem()?;
        let solution = method.solve(&problem, &config)?;
        Ok(SolveResponse::new(&solution, method))
    }

    pub fn handle(&self, http_method: &str, body: &str) -> Response {
        if !http_method.eq_ignore_ascii_case("POST") {
            return Response::ok(json!({ "message": "Send POST request" }));
        }

        let request: SolveRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                debug!("rejecting malformed request: {}", err);
                return Response::error(400, format!("invalid request: {}", err));
            },
        };

        match self.solve(request) {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(body) => Response::ok(body),
                Err(err) => Response::error(500, format!("could not encode response: {}", err)),
            },
            Err(err) if err.is_input_error() => {
                debug!("rejecting invalid problem: {}", err);
                Response::error(400, err.to_string())
            },
            Err(err) => {
                warn!("solver failed: {}", err);
                Response::error(500, err.to_string())
            },
        }
    }
}

#[cfg(test)]
const CANONICAL: &str = r#"{
    "objective": [3, 5],
    "constraints": [[1, 0], [0, 2], [3, 2]],
    "rhs": [4, 12, 18]
}"#;

#[test]
fn solve_canonical() {
    let response = Handler::default().handle("POST", CANONICAL);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, json!({
        "status": "Optimal",
        "optimalValue": 36.0,
        "variables": { "x1": 2.0, "x2": 6.0 },
        "iterations": 2,
        "method": "two-phase",
    }));
}

#[test]
fn variables_keep_index_order() {
    let body = r#"{
        "objective": [1, 1, 1],
        "constraints": [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
        "rhs": [1, 2, 3]
    }"#;
    let response = Handler::default().handle("POST", body);
    let keys: Vec<&String> = response.body["variables"]
        .as_object()
        .expect("Variables should be an object")
        .keys()
        .collect();
    assert_eq!(keys, vec!["x1", "x2", "x3"]);
}

#[test]
fn infeasible_has_no_solution_fields() {
    let body = r#"{
        "objective": [1],
        "constraints": [[1], [1]],
        "rhs": [5, 2],
        "relations": [">=", "<="]
    }"#;
    let response = Handler::default().handle("POST", body);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, json!({
        "status": "Infeasible",
        "iterations": 1,
        "method": "two-phase",
    }));
}

#[test]
fn negative_right_hand_sides() {
    let body = r#"{
        "objective": [-1, 1],
        "constraints": [[1, -1], [1, 0]],
        "rhs": [-3, 10],
        "relations": [">=", "<="]
    }"#;
    let response = Handler::default().handle("POST", body);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, json!({
        "status": "Optimal",
        "optimalValue": 3.0,
        "variables": { "x1": 0.0, "x2": 3.0 },
        "iterations": 1,
        "method": "two-phase",
    }));

    let body = r#"{"objective": [1], "constraints": [[1]], "rhs": [-1]}"#;
    let response = Handler::default().handle("POST", body);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, json!({
        "status": "Infeasible",
        "iterations": 0,
        "method": "two-phase",
    }));
}

#[test]
fn request_options() {
    let body = r#"{
        "objective": [2, 3],
        "constraints": [[1, 1], [1, 0]],
        "rhs": [4, 3],
        "relations": ["ge", "≤"],
        "sense": "minimize",
        "method": "dual"
    }"#;
    let response = Handler::default().handle("POST", body);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["status"], "Optimal");
    assert_eq!(response.body["method"], "dual");
    let value = response.body["optimalValue"].as_f64().expect("Value should be a number");
    assert!((value - 9.0).abs() < 1e-6);

    let capped = CANONICAL.replace("\"rhs\"", "\"maxIterations\": 1, \"rhs\"");
    let response = Handler::default().handle("POST", &capped);
    assert_eq!(response.body["status"], "IterationLimitExceeded");
    assert_eq!(response.body["iterations"], 1);
}

#[test]
fn default_method_is_overridden_by_request() {
    let handler = Handler::new(SolverConfig::default()).with_default_method(Method::Dual);
    let response = handler.handle("POST", CANONICAL);
    assert_eq!(response.body["method"], "dual");

    let body = CANONICAL.replace("\"rhs\"", "\"method\": \"two-phase\", \"rhs\"");
    let response = handler.handle("POST", &body);
    assert_eq!(response.body["method"], "two-phase");
}

#[test]
fn non_post_gets_a_hint() {
    let response = Handler::default().handle("GET", "");
    assert_eq!(response, Response {
        status_code: 200,
        body: json!({ "message": "Send POST request" }),
    });
}

#[test]
fn malformed_requests_are_rejected() {
    let handler = Handler::default();
    let bodies = [
        "not json",
        r#"[1, 2, 3]"#,
        r#"{"objective": [1], "constraints": 5, "rhs": [1]}"#,
        r#"{"objective": [1, 2], "constraints": [[1]], "rhs": [1]}"#,
        r#"{"objective": [], "constraints": [], "rhs": []}"#,
        r#"{"objective": [1], "constraints": [[1]], "rhs": [1, 2]}"#,
        r#"{"objective": [1], "constraints": [[1]], "rhs": [1], "relations": ["<"]}"#,
        r#"{"objective": [1], "constraints": [[1]]}"#,
    ];
    for body in bodies.iter() {
        let response = handler.handle("POST", body);
        assert_eq!(response.status_code, 400, "body {} should be rejected", body);
        assert!(response.body["error"].is_string());
    }
}

#[test]
fn engine_failures_are_server_errors() {
    let config = SolverConfig {
        feasibility_tolerance: 0.0,
        ..SolverConfig::default()
    };
    let response = Handler::new(config).handle("POST", CANONICAL);
    assert_eq!(response.status_code, 500);
    assert!(response.body["error"].is_string());
}
