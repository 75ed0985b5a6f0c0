use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;

use super::{
    dtos::{
        auth::{LoginDTO, TokenDTO},
        todo::TodoListDTO,
    },
    errors::normalize_error,
    transport::{ApiRequest, ApiResponse, Transport},
};
use crate::{
    errors::TodoError,
    models::todo_model::{NewTodo, TogglePayload, Todo},
    utils::{make_api_url, CredentialStore},
};

/// Talks to the todo backend.
///
/// Every request passes through `prepare`, which injects the stored token,
/// and every response through `check`, which turns non-2xx statuses into a
/// `TodoError`.
pub struct ApiClient<T: Transport> {
    base_url: String,
    transport: T,
    credentials: CredentialStore,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T, credentials: CredentialStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every todo of the current user
    pub fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let response = self.send(Method::GET, "todos", None)?;

        let list: TodoListDTO = decode(&response)?;

        Ok(list.into_todos())
    }

    pub fn get_todo(&self, id: i64) -> Result<Todo, TodoError> {
        let response = self.send(Method::GET, &format!("todos/{}", id), None)?;

        decode(&response)
    }

    pub fn create_todo(&self, todo: &NewTodo) -> Result<Todo, TodoError> {
        let body = serde_json::to_value(todo)?;

        let response = self.send(Method::POST, "todos", Some(body))?;

        decode(&response)
    }

    /// Replace title and description of a todo
    pub fn update_todo(&self, id: i64, todo: &NewTodo) -> Result<Todo, TodoError> {
        let body = serde_json::to_value(todo)?;

        let response = self.send(Method::PUT, &format!("todos/{}", id), Some(body))?;

        decode(&response)
    }

    /// Set the completion flag of a todo
    pub fn toggle_todo(&self, id: i64, completed: bool) -> Result<Todo, TodoError> {
        let body = serde_json::to_value(TogglePayload { completed })?;

        let response = self.send(Method::PATCH, &format!("todos/{}", id), Some(body))?;

        decode(&response)
    }

    pub fn delete_todo(&self, id: i64) -> Result<(), TodoError> {
        self.send(Method::DELETE, &format!("todos/{}", id), None)?;

        Ok(())
    }

    /// Log in and persist the returned token
    pub fn login(&self, email: &str, password: &str) -> Result<(), TodoError> {
        let body = serde_json::to_value(LoginDTO {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let response = self.send(Method::POST, "auth/login", Some(body))?;

        let token = decode::<TokenDTO>(&response)?
            .into_token()
            .ok_or_else(|| TodoError::Decode(String::from("Token Not Found in response")))?;

        self.credentials.save(&token)?;

        log::info!("Logged in as {}", email);

        Ok(())
    }

    pub fn logout(&self) -> Result<(), TodoError> {
        self.credentials.clear()
    }

    /// Succeeds when the backend answers its health endpoint with 2xx
    pub fn health(&self) -> Result<(), TodoError> {
        self.send(Method::GET, "health", None)?;

        Ok(())
    }

    fn send(
        &self,
        method: Method,
        resource: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, TodoError> {
        let request = self.prepare(ApiRequest::new(
            method,
            make_api_url(&self.base_url, resource),
            body,
        ))?;

        log::debug!("{} {}", request.method, request.url);

        let response = self.transport.execute(request)?;

        self.check(response, resource)
    }

    fn prepare(&self, mut request: ApiRequest) -> Result<ApiRequest, TodoError> {
        if let Some(token) = self.credentials.load()? {
            request
                .headers
                .push((AUTHORIZATION.to_string(), format!("Bearer {}", token)));
        }

        if request.body.is_some() {
            request
                .headers
                .push((CONTENT_TYPE.to_string(), String::from("application/json")));
        }

        Ok(request)
    }

    fn check(&self, response: ApiResponse, resource: &str) -> Result<ApiResponse, TodoError> {
        if response.is_success() {
            return Ok(response);
        }

        let error = normalize_error(response.status, &response.body, resource);

        // a rejected token is useless, force a fresh login
        if response.status == 401 {
            if let Err(e) = self.credentials.clear() {
                log::warn!("Could not clear stored token: {}", e);
            }
        }

        log::warn!("{} failed: {}", resource, error);

        Err(error)
    }
}

fn decode<D: DeserializeOwned>(response: &ApiResponse) -> Result<D, TodoError> {
    serde_json::from_str(&response.body).map_err(|e| TodoError::Decode(e.to_string()))
}


#[cfg(test)]
mod client_test {
    use reqwest::Method;

    use super::test_support::{client, todo_json};
    use crate::{errors::TodoError, models::todo_model::TodoForm};

    #[test]
    fn test_list_todos_bare_array() {
        let (_dir, client) = client();
        client.transport().respond(
            200,
            format!("[{}, {}]", todo_json(1, "a", false), todo_json(2, "b", true)),
        );

        let todos = client.list_todos().unwrap();

        assert_eq!(todos.len(), 2);
        assert!(todos[1].completed);

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "http://localhost:8000/api/todos");
        assert_eq!(request.header("authorization"), None);
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn test_list_todos_wrapped() {
        let (_dir, client) = client();
        client
            .transport()
            .respond(200, format!(r#"{{"todos": [{}]}}"#, todo_json(3, "c", false)))
            .respond(200, format!(r#"{{"items": [{}]}}"#, todo_json(4, "d", false)));

        assert_eq!(client.list_todos().unwrap()[0].id, 3);
        assert_eq!(client.list_todos().unwrap()[0].id, 4);
    }

    #[test]
    fn test_token_is_injected() {
        let (_dir, client) = client();
        client.credentials().save("secret").unwrap();
        client.transport().respond(200, "[]");

        client.list_todos().unwrap();

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer secret"));
    }

    #[test]
    fn test_create_todo_sends_json() {
        let (_dir, client) = client();
        client.transport().respond(201, todo_json(5, "Read", false));

        let payload = TodoForm::new("Read", "chapter 3").validate().unwrap();
        let todo = client.create_todo(&payload).unwrap();

        assert_eq!(todo.id, 5);

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body,
            Some(serde_json::json!({"title": "Read", "description": "chapter 3"}))
        );
    }

    #[test]
    fn test_update_and_toggle_requests() {
        let (_dir, client) = client();
        client
            .transport()
            .respond(200, todo_json(5, "Renamed", false))
            .respond(200, todo_json(5, "Renamed", true));

        let payload = TodoForm::new("Renamed", "").validate().unwrap();
        client.update_todo(5, &payload).unwrap();
        let toggled = client.toggle_todo(5, true).unwrap();

        assert!(toggled.completed);

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url, "http://localhost:8000/api/todos/5");
        assert_eq!(requests[1].method, Method::PATCH);
        assert_eq!(requests[1].body, Some(serde_json::json!({"completed": true})));
    }

    #[test]
    fn test_delete_accepts_no_content() {
        let (_dir, client) = client();
        client.transport().respond(204, "");

        assert!(client.delete_todo(8).is_ok());
        assert_eq!(
            client.transport().last_request().unwrap().method,
            Method::DELETE
        );
    }

    #[test]
    fn test_not_found() {
        let (_dir, client) = client();
        client
            .transport()
            .respond(404, r#"{"detail": "Todo not found"}"#);

        let err = client.get_todo(42).unwrap_err();

        assert!(matches!(err, TodoError::NotFound(r) if r == "todos/42"));
    }

    #[test]
    fn test_unauthorized_clears_token() {
        let (_dir, client) = client();
        client.credentials().save("stale").unwrap();
        client
            .transport()
            .respond(401, r#"{"detail": "Could not validate credentials"}"#);

        let err = client.list_todos().unwrap_err();

        assert!(err.is_auth());
        assert_eq!(client.credentials().load().unwrap(), None);
    }

    #[test]
    fn test_forbidden_keeps_token() {
        let (_dir, client) = client();
        client.credentials().save("valid").unwrap();
        client.transport().respond(403, "");

        assert!(client.delete_todo(1).unwrap_err().is_auth());
        assert_eq!(
            client.credentials().load().unwrap(),
            Some(String::from("valid"))
        );
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let (_dir, client) = client();
        client.transport().respond(200, "{\"oops\": true}");

        assert!(matches!(
            client.list_todos().unwrap_err(),
            TodoError::Decode(_)
        ));
    }

    #[test]
    fn test_login_saves_access_token() {
        let (_dir, client) = client();
        client
            .transport()
            .respond(200, r#"{"access_token": "fresh", "token_type": "bearer"}"#);

        client.login("me@example.com", "hunter2").unwrap();

        assert_eq!(
            client.credentials().load().unwrap(),
            Some(String::from("fresh"))
        );
        let request = client.transport().last_request().unwrap();
        assert_eq!(request.url, "http://localhost:8000/api/auth/login");
        assert_eq!(request.body.unwrap()["email"], "me@example.com");
    }

    #[test]
    fn test_login_without_token() {
        let (_dir, client) = client();
        client.transport().respond(200, "{}");

        assert!(matches!(
            client.login("me@example.com", "pw"),
            Err(TodoError::Decode(_))
        ));
    }

    #[test]
    fn test_logout() {
        let (_dir, client) = client();
        client.credentials().save("abc").unwrap();

        client.logout().unwrap();

        assert_eq!(client.credentials().load().unwrap(), None);
    }

    #[test]
    fn test_network_failure_passes_through() {
        let (_dir, client) = client();
        client
            .transport()
            .fail(TodoError::Network(String::from("connection refused")));

        assert!(matches!(
            client.health().unwrap_err(),
            TodoError::Network(_)
        ));
    }
}
