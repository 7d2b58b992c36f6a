//! Users and their authentication.

use super::{allocate, mutate, procedure, ResourceKind, Service, UnfilteredPool};
use super::Group;
use crate::error::Result;
use crate::resource::envelope;
use crate::rpc::Value;
use crate::template::Blueprint;

envelope!(
    /// A user snapshot.
    User,
    "USER"
);

impl User {
    /// Primary and secondary group IDs, in document order.
    pub fn group_ids(&self) -> Result<Vec<i32>> {
        self.ids("GROUPS/ID")
    }

    pub fn auth_driver(&self) -> String {
        self.attribute("AUTH_DRIVER")
    }

    pub fn is_enabled(&self) -> Result<bool> {
        let flag: i32 = self.parse_attribute("ENABLED")?;
        Ok(flag != 0)
    }
}

impl ResourceKind for User {
    const PREFIX: &'static str = "one.user";
    const POOL_INFO: &'static str = "one.userpool.info";
    const ELEMENT: &'static str = "USER";
}

impl UnfilteredPool for User {}

impl Service<'_, User> {
    /// Create a user.
    ///
    /// An empty `driver` selects the server default; `groups` are joined in
    /// order and the first becomes the primary group.
    pub async fn allocate(
        &self,
        name: &str,
        password: &str,
        driver: &str,
        groups: &[Group],
    ) -> Result<User> {
        let group_ids = groups
            .iter()
            .map(|group| group.id().map(Value::Int))
            .collect::<Result<Vec<_>>>()?;
        allocate(
            self.client,
            vec![
                Value::from(name),
                Value::from(password),
                Value::from(driver),
                Value::Array(group_ids),
            ],
        )
        .await
    }

    pub async fn passwd(&self, user: &User, password: &str) -> Result<()> {
        self.apply("passwd", user, vec![Value::from(password)]).await
    }

    /// Issue a login token for `username`.
    ///
    /// An empty `token` asks the server to generate one. `ttl_secs` of 0
    /// expires existing tokens; `Group::none()` keeps the token unscoped.
    pub async fn login(
        &self,
        username: &str,
        token: &str,
        ttl_secs: i32,
        group: &Group,
    ) -> Result<String> {
        let group_id = group.reference_id()?;
        let result = self
            .client
            .call(
                &procedure::<User>("login"),
                vec![
                    Value::from(username),
                    Value::from(token),
                    Value::Int(ttl_secs),
                    Value::Int(group_id),
                ],
            )
            .await?;
        Ok(result.body()?.to_string())
    }

    /// Change the authentication driver and, optionally, the password.
    pub async fn chauth(&self, user: &User, driver: &str, password: &str) -> Result<()> {
        self.apply("chauth", user, vec![Value::from(driver), Value::from(password)])
            .await
    }

    /// Change the primary group.
    pub async fn chgrp(&self, user: &User, group: &Group) -> Result<()> {
        let group_id = group.id()?;
        self.apply("chgrp", user, vec![Value::Int(group_id)]).await
    }

    pub async fn add_group(&self, user: &User, group: &Group) -> Result<()> {
        let group_id = group.id()?;
        self.apply("addgroup", user, vec![Value::Int(group_id)]).await
    }

    pub async fn del_group(&self, user: &User, group: &Group) -> Result<()> {
        let group_id = group.id()?;
        self.apply("delgroup", user, vec![Value::Int(group_id)]).await
    }

    /// Set the user's quota limits.
    pub async fn quota<B: Blueprint + ?Sized>(&self, user: &User, quota: &B) -> Result<()> {
        let text = quota.render()?;
        self.apply("quota", user, vec![Value::String(text)]).await
    }

    async fn apply(&self, verb: &str, user: &User, extra: Vec<Value>) -> Result<()> {
        mutate(self.client, &procedure::<User>(verb), user, extra).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{args, client, methods};
    use super::*;
    use crate::error::ClientError;
    use crate::resource::Resource;

    #[tokio::test]
    async fn test_allocate_with_groups() {
        let (client, mock) = client();
        mock.succeed("one.user.allocate", 5).succeed(
            "one.user.info",
            "<USER><ID>5</ID><NAME>alice</NAME><GROUPS><ID>100</ID><ID>1</ID></GROUPS></USER>",
        );

        let user = client
            .users()
            .allocate("alice", "s3cret", "", &[Group::with_id(100), Group::with_id(1)])
            .await
            .unwrap();

        assert_eq!(user.group_ids().unwrap(), vec![100, 1]);
        assert_eq!(
            args(&mock, 0),
            vec![
                Value::from("alice"),
                Value::from("s3cret"),
                Value::from(""),
                Value::Array(vec![Value::Int(100), Value::Int(1)])
            ]
        );
    }

    #[tokio::test]
    async fn test_allocate_with_unresolved_group_sends_nothing() {
        let (client, mock) = client();

        let err = client
            .users()
            .allocate("bob", "pw", "core", &[Group::default()])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));
        assert!(methods(&mock).is_empty());
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let (client, mock) = client();
        mock.succeed("one.user.login", "b7f3c1e2a9");

        let token = client
            .users()
            .login("alice", "", 3600, &Group::none())
            .await
            .unwrap();

        assert_eq!(token, "b7f3c1e2a9");
        assert_eq!(
            args(&mock, 0),
            vec![Value::from("alice"), Value::from(""), Value::Int(3600), Value::Int(-1)]
        );
    }

    #[tokio::test]
    async fn test_group_membership() {
        let (client, mock) = client();
        mock.succeed("one.user.chgrp", 5)
            .succeed("one.user.addgroup", 5)
            .succeed("one.user.delgroup", 5);

        let user = User::with_id(5);
        let users = client.users();
        users.chgrp(&user, &Group::with_id(1)).await.unwrap();
        users.add_group(&user, &Group::with_id(101)).await.unwrap();
        users.del_group(&user, &Group::with_id(100)).await.unwrap();

        assert_eq!(
            methods(&mock),
            vec!["one.user.chgrp", "one.user.addgroup", "one.user.delgroup"]
        );
        assert_eq!(args(&mock, 1), vec![Value::Int(5), Value::Int(101)]);
    }

    #[tokio::test]
    async fn test_passwd_and_chauth() {
        let (client, mock) = client();
        mock.succeed("one.user.passwd", 5).succeed("one.user.chauth", 5);

        let user = User::with_id(5);
        client.users().passwd(&user, "n3w").await.unwrap();
        client.users().chauth(&user, "ldap", "").await.unwrap();

        assert_eq!(args(&mock, 0), vec![Value::Int(5), Value::from("n3w")]);
        assert_eq!(
            args(&mock, 1),
            vec![Value::Int(5), Value::from("ldap"), Value::from("")]
        );
    }

    #[test]
    fn test_accessors() {
        let user = User::from(
            Resource::parse(
                "<USER><ID>0</ID><NAME>oneadmin</NAME><AUTH_DRIVER>core</AUTH_DRIVER>\
                 <ENABLED>1</ENABLED><GROUPS><ID>0</ID></GROUPS></USER>",
            )
            .unwrap(),
        );
        assert_eq!(user.auth_driver(), "core");
        assert!(user.is_enabled().unwrap());
        assert_eq!(user.group_ids().unwrap(), vec![0]);
    }
}
