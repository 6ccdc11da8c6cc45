//! Authentication [`Method`] definitions.

use serde::{Serialize, Serializer};

common::define_kind! {
    #[doc = "Method a user authenticated with."]
    enum Method {
        #[doc = "Login and password."]
        Password = 1,

        #[doc = "Another valid token."]
        Token = 2,

        #[doc = "CAS single sign-on."]
        Cas = 3,

        #[doc = "SAML 2.0 single sign-on."]
        Saml = 4,

        #[doc = "OpenID Connect single sign-on."]
        Oidc = 5,

        #[doc = "OAuth 2.0 single sign-on."]
        Oauth2 = 6,

        #[doc = "LDAP bind."]
        Ldap = 7,
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
