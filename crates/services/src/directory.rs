//! Properties, requesters, and tags.

use std::sync::Arc;

use domains::validate::{self, TEXT_MAX};
use domains::{
    Actor, Address, Clock, DirectoryRepository, DomainError, Id, NewProperty, NewRequester, NewTag,
    Property, Requester, Result, Stamp, Tag,
};

#[derive(Clone)]
pub struct DirectoryService {
    repo: Arc<dyn DirectoryRepository>,
    clock: Arc<dyn Clock>,
}

impl DirectoryService {
    pub fn new(repo: Arc<dyn DirectoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create_property(&self, actor: &Actor, new: NewProperty) -> Result<Property> {
        check_address(&new.address)?;
        validate::max_len("subdivision", &new.subdivision, TEXT_MAX)?;
        validate::max_len("policy_number", &new.policy_number, TEXT_MAX)?;

        let property = Property {
            id: 0,
            address: new.address,
            subdivision: new.subdivision,
            policy_number: new.policy_number,
            stamp: Stamp::created(actor, self.clock.today()),
        };
        self.repo.insert_property(property, actor).await
    }

    pub async fn get_property(&self, id: Id) -> Result<Property> {
        self.repo.get_property(id).await?.ok_or_else(|| DomainError::not_found("Property", id))
    }

    pub async fn list_properties(&self) -> Result<Vec<Property>> {
        self.repo.list_properties().await
    }

    pub async fn create_requester(&self, actor: &Actor, new: NewRequester) -> Result<Requester> {
        validate::max_len("salutation", &new.salutation, 16)?;
        validate::max_len("first_name", &new.first_name, TEXT_MAX)?;
        validate::max_len("last_name", &new.last_name, TEXT_MAX)?;
        validate::max_len("organization", &new.organization, TEXT_MAX)?;
        validate::max_len("email", &new.email, TEXT_MAX)?;
        validate::email("email", &new.email)?;
        check_address(&new.address)?;

        let requester = Requester {
            id: 0,
            salutation: new.salutation,
            first_name: new.first_name,
            last_name: new.last_name,
            organization: new.organization,
            email: new.email,
            address: new.address,
            stamp: Stamp::created(actor, self.clock.today()),
        };
        self.repo.insert_requester(requester, actor).await
    }

    pub async fn get_requester(&self, id: Id) -> Result<Requester> {
        self.repo.get_requester(id).await?.ok_or_else(|| DomainError::not_found("Requester", id))
    }

    pub async fn list_requesters(&self) -> Result<Vec<Requester>> {
        self.repo.list_requesters().await
    }

    pub async fn create_tag(&self, actor: &Actor, new: NewTag) -> Result<Tag> {
        validate::required("name", &new.name)?;
        validate::max_len("name", &new.name, TEXT_MAX)?;

        let tag = Tag {
            id: 0,
            name: new.name,
            description: new.description,
            stamp: Stamp::created(actor, self.clock.today()),
        };
        self.repo.insert_tag(tag, actor).await
    }

    pub async fn get_tag(&self, id: Id) -> Result<Tag> {
        self.repo.get_tag(id).await?.ok_or_else(|| DomainError::not_found("Tag", id))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.repo.list_tags().await
    }
}

fn check_address(address: &Address) -> Result<()> {
    validate::max_len("street", &address.street, TEXT_MAX)?;
    validate::max_len("unit", &address.unit, TEXT_MAX)?;
    validate::max_len("city", &address.city, TEXT_MAX)?;
    validate::us_state("state", address.state.as_deref())?;
    validate::us_zip("zipcode", address.zipcode.as_deref())
}
