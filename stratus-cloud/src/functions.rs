//! Function-management collaborator: existence probe, create, source patch,
//! and IAM policy convergence.

use serde::{Deserialize, Serialize};

use stratus_core::FunctionConfig;

use crate::auth::AccessToken;
use crate::error::{body_err, http_err, CloudError};

/// Role granted to public invokers.
pub const INVOKER_ROLE: &str = "roles/cloudfunctions.invoker";

/// The all-callers principal.
pub const ALL_USERS: &str = "allUsers";

// ---------------------------------------------------------------------------
// IAM policy types
// ---------------------------------------------------------------------------

/// An IAM policy attached to a deployed function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<IamBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBinding {
    pub role: String,
    pub members: Vec<String>,
}

impl IamPolicy {
    /// Whether any binding exists at all. This is deliberately the coarse
    /// check: a policy with unrelated bindings counts as "already authorized".
    pub fn has_bindings(&self) -> bool {
        !self.bindings.is_empty()
    }

    /// A policy granting invocation to any caller.
    pub fn public_invoker() -> Self {
        Self {
            bindings: vec![IamBinding {
                role: INVOKER_ROLE.to_string(),
                members: vec![ALL_USERS.to_string()],
            }],
            etag: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator trait
// ---------------------------------------------------------------------------

/// The function-management API as consumed by the reconciler.
pub trait FunctionsApi {
    /// Whether a function exists at the fully-qualified path.
    fn function_exists(&self, function_path: &str) -> Result<bool, CloudError>;

    /// Create a function under `location_path` from the full descriptor.
    fn create_function(
        &self,
        location_path: &str,
        config: &FunctionConfig,
    ) -> Result<(), CloudError>;

    /// Patch an existing function, naming only the source reference as
    /// changed. The remote keeps every other field as-is.
    fn patch_function_source(
        &self,
        function_path: &str,
        config: &FunctionConfig,
    ) -> Result<(), CloudError>;

    fn get_iam_policy(&self, function_path: &str) -> Result<IamPolicy, CloudError>;

    fn set_iam_policy(
        &self,
        function_path: &str,
        policy: &IamPolicy,
    ) -> Result<IamPolicy, CloudError>;
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

const FUNCTIONS_API_BASE: &str = "https://cloudfunctions.googleapis.com/v1";

/// ureq-backed client for the functions REST API.
pub struct HttpFunctionsClient {
    agent: ureq::Agent,
    token: AccessToken,
}

impl HttpFunctionsClient {
    pub fn new(token: AccessToken) -> Self {
        Self {
            agent: ureq::agent(),
            token,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{FUNCTIONS_API_BASE}/{suffix}")
    }
}

#[derive(Serialize)]
struct SetIamPolicyRequest<'a> {
    policy: &'a IamPolicy,
}

impl FunctionsApi for HttpFunctionsClient {
    fn function_exists(&self, function_path: &str) -> Result<bool, CloudError> {
        let url = self.url(function_path);
        match self
            .agent
            .get(&url)
            .set("Authorization", &self.token.bearer())
            .call()
        {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(err) => Err(http_err(&url, err)),
        }
    }

    fn create_function(
        &self,
        location_path: &str,
        config: &FunctionConfig,
    ) -> Result<(), CloudError> {
        let url = self.url(&format!("{location_path}/functions"));
        self.agent
            .post(&url)
            .set("Authorization", &self.token.bearer())
            .send_json(config)
            .map_err(|e| http_err(&url, e))?;
        Ok(())
    }

    fn patch_function_source(
        &self,
        function_path: &str,
        config: &FunctionConfig,
    ) -> Result<(), CloudError> {
        let url = self.url(function_path);
        self.agent
            .request("PATCH", &url)
            .query("updateMask", "sourceArchiveUrl")
            .set("Authorization", &self.token.bearer())
            .send_json(config)
            .map_err(|e| http_err(&url, e))?;
        Ok(())
    }

    fn get_iam_policy(&self, function_path: &str) -> Result<IamPolicy, CloudError> {
        let url = self.url(&format!("{function_path}:getIamPolicy"));
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.token.bearer())
            .call()
            .map_err(|e| http_err(&url, e))?;
        response.into_json().map_err(|e| body_err(&url, e))
    }

    fn set_iam_policy(
        &self,
        function_path: &str,
        policy: &IamPolicy,
    ) -> Result<IamPolicy, CloudError> {
        let url = self.url(&format!("{function_path}:setIamPolicy"));
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &self.token.bearer())
            .send_json(SetIamPolicyRequest { policy })
            .map_err(|e| http_err(&url, e))?;
        response.into_json().map_err(|e| body_err(&url, e))
    }
}
