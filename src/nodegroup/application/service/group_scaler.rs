use crate::{
    core::domain::{
        error::{AutoscalerError, AutoscalerResult},
        model::vm_profile::VmProfile,
    },
    nodegroup::application::{
        request::{create_tags_request::CreateTagsRequest, deploy_vm_request::DeployVmRequest},
        service::provisioner::Provisioner,
    },
};
use rand::Rng;
use tokio::task::JoinSet;
use tracing::info;

/// Longest name CloudStack accepts for an instance.
pub const MAX_NAME_LENGTH: usize = 63;

/// Builds `"<base>-<random u64>"`, cut to [`MAX_NAME_LENGTH`] characters.
///
/// Overlong names are truncated rather than hashed, so two names can collide
/// when the random suffix is cut.
pub fn random_name<R: Rng + ?Sized>(base: &str, rng: &mut R) -> String {
    let name = format!("{}-{}", base, rng.r#gen::<u64>());
    name.chars().take(MAX_NAME_LENGTH).collect()
}

/// Grows a node group by a batch of concurrent, independent creations.
#[derive(Clone)]
pub struct GroupScaler {
    provisioner: Provisioner,
}

impl GroupScaler {
    pub fn new(provisioner: Provisioner) -> Self {
        Self { provisioner }
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// Creates `count` instances of `profile` concurrently and waits for all
    /// of them.
    ///
    /// Successful creations are kept even when others fail; the error lists
    /// every failed unit.
    pub async fn scale_up(&self, profile: &VmProfile, count: usize) -> AutoscalerResult<()> {
        let deploy = DeployVmRequest::from_profile(profile);
        let tags = CreateTagsRequest::for_profile(profile);
        let names: Vec<String> = {
            let mut rng = rand::thread_rng();
            (0..count).map(|_| random_name(profile.id(), &mut rng)).collect()
        };
        info!(group = profile.id(), count, "scaling up node group");

        let mut tasks = JoinSet::new();
        for name in names {
            let provisioner = self.provisioner.clone();
            let deploy = deploy.clone().with_name(name);
            let tags = tags.clone();
            tasks.spawn(async move { provisioner.create(&deploy, &tags).await });
        }

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => errors.push(e.to_string()),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AutoscalerError::ScaleUp(errors))
        }
    }
}
