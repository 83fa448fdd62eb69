use std::sync::Arc;

use crate::configuration::{Configuration, Error};
use crate::lock::{AddLock, CasLock, Granule, Lock, Strategy};

pub fn create_lock(config: &Configuration) -> Result<Arc<dyn Lock>, Error> {
    let lock: Arc<dyn Lock> = match config.lock.strategy {
        Strategy::Add => Arc::new(AddLock::new(
            config.store.to_add_store()?,
            config.lock.clone(),
        )),
        Strategy::Cas => Arc::new(CasLock::new(
            config.store.to_cas_store()?,
            config.lock.clone(),
        )),
    };

    Ok(lock)
}

pub fn create_granule(config: &Configuration) -> Result<Granule, Error> {
    Ok(Granule::new(create_lock(config)?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_create_add_lock() {
        let config = Configuration::load_from_str("[lock]\nstrategy = \"add\"").unwrap();
        let lock = create_lock(&config).unwrap();

        assert!(format!("{lock:?}").starts_with("AddLock"));
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(true));
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(false));
    }

    #[tokio::test]
    async fn test_create_cas_lock() {
        let config = Configuration::load_from_str("[lock]\nstrategy = \"cas\"").unwrap();
        let granule = create_granule(&config).unwrap();

        assert!(format!("{:?}", granule.lock()).starts_with("CasLock"));
        assert_eq!(granule.granule("job", || async { 1 }, None).await, Ok(1));
    }

    #[test]
    fn test_invalid_store() {
        let config = Configuration::load_from_str("[store.redis]\nurl = \"localhost\"").unwrap();
        assert!(matches!(create_lock(&config), Err(Error::Store(_))));
    }
}
