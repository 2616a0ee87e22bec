#![allow(dead_code)]

use domain_mirror::domain::model::{
    Annotation, FieldDescriptor, MethodDescriptor, TypeDescriptor, TypeParameter, TypeRef,
};
use domain_mirror::{MarkerSet, MirrorConfig, StaticCatalog};

pub const JAKARTA: &str = "jakarta.validation.constraints.";

pub fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

pub fn generic(name: &str, args: &[&str]) -> TypeRef {
    TypeRef::generic(name, args.iter().map(|a| TypeRef::named(*a)).collect())
}

pub fn constraint(name: &str) -> Annotation {
    Annotation::new(format!("{}{}", JAKARTA, name))
}

/// `domain.types.*` 能力 marker；服務類都延伸 ServiceKind
pub fn marker_types() -> Vec<TypeDescriptor> {
    let service = || named("domain.types.ServiceKind");
    vec![
        TypeDescriptor::interface("domain.types.Entity").type_param(TypeParameter::new("ID")),
        TypeDescriptor::interface("domain.types.AggregateRoot")
            .type_param(TypeParameter::new("ID"))
            .implements(TypeRef::generic("domain.types.Entity", vec![TypeRef::var("ID")])),
        TypeDescriptor::interface("domain.types.ValueObject"),
        TypeDescriptor::interface("domain.types.Identity").type_param(TypeParameter::new("V")),
        TypeDescriptor::interface("domain.types.DomainEvent"),
        TypeDescriptor::interface("domain.types.DomainCommand").type_param(TypeParameter::bounded(
            "T",
            named("domain.types.AggregateRoot"),
        )),
        TypeDescriptor::interface("domain.types.ServiceKind"),
        TypeDescriptor::interface("domain.types.Repository")
            .type_param(TypeParameter::new("ID"))
            .type_param(TypeParameter::bounded(
                "A",
                TypeRef::generic("domain.types.AggregateRoot", vec![TypeRef::var("ID")]),
            ))
            .implements(service()),
        TypeDescriptor::interface("domain.types.ApplicationService").implements(service()),
        TypeDescriptor::interface("domain.types.DomainService").implements(service()),
        TypeDescriptor::interface("domain.types.OutboundService").implements(service()),
        TypeDescriptor::interface("domain.types.QueryClient")
            .type_param(TypeParameter::new("R"))
            .implements(service()),
        TypeDescriptor::interface("domain.types.QueryHandler")
            .type_param(TypeParameter::new("R"))
            .implements(service()),
        TypeDescriptor::interface("domain.types.ReadModel"),
    ]
}

/// 一個小型訂單領域，涵蓋每一種變體
pub fn shop_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::enumeration("shop.Status", &["OPEN", "PLACED", "CANCELLED"]),
        TypeDescriptor::enumeration("shop.Currency", &["EUR", "USD"]),
        TypeDescriptor::record("shop.OrderId")
            .implements(generic("domain.types.Identity", &["java.util.UUID"]))
            .field(FieldDescriptor::new("value", named("java.util.UUID")).final_())
            .method(MethodDescriptor::new("value").returns(named("java.util.UUID"))),
        TypeDescriptor::class("shop.Money")
            .implements(named("domain.types.ValueObject"))
            .field(
                FieldDescriptor::new("amount", named("java.math.BigDecimal"))
                    .final_()
                    .annotated(constraint("NotNull"))
                    .annotated(constraint("DecimalMin").with("value", "0")),
            )
            .field(FieldDescriptor::new("currency", named("shop.Currency")).final_()),
        TypeDescriptor::class("shop.BaseEntity")
            .abstract_()
            .type_param(TypeParameter::new("ID"))
            .implements(TypeRef::generic("domain.types.Entity", vec![TypeRef::var("ID")]))
            .field(FieldDescriptor::new("id", TypeRef::var("ID")))
            .field(
                FieldDescriptor::new("version", named("java.lang.Long"))
                    .annotated(Annotation::new("domain.annotations.ConcurrencyVersion")),
            )
            .method(MethodDescriptor::new("getId").returns(TypeRef::var("ID")))
            .method(MethodDescriptor::new("describe").returns(named("java.lang.String"))),
        TypeDescriptor::class("shop.Order")
            .extends(generic("shop.BaseEntity", &["shop.OrderId"]))
            .implements(generic("domain.types.AggregateRoot", &["shop.OrderId"]))
            .field(
                FieldDescriptor::new("lines", generic("java.util.List", &["shop.OrderLine"]))
                    .annotated(constraint("NotEmpty"))
                    .element_annotated(constraint("NotNull")),
            )
            .field(FieldDescriptor::new("total", named("shop.Money")))
            .field(FieldDescriptor::new("status", named("shop.Status")))
            .field(
                FieldDescriptor::new("note", named("java.lang.String"))
                    .annotated(constraint("Size").with("max", "200")),
            )
            .method(
                MethodDescriptor::new("place").annotated(
                    Annotation::new("domain.annotations.Publishes")
                        .with_list("domainEventTypes", &["shop.OrderPlaced"]),
                ),
            )
            .method(MethodDescriptor::new("getTotal").returns(named("shop.Money")))
            .method(MethodDescriptor::new("describe").returns(named("java.lang.String"))),
        TypeDescriptor::class("shop.OrderLine")
            .extends(generic("shop.BaseEntity", &["java.lang.Long"]))
            .field(FieldDescriptor::new("quantity", named("int")).annotated(constraint("Positive")))
            .field(FieldDescriptor::new("price", named("shop.Money"))),
        TypeDescriptor::class("shop.OrderPlaced")
            .implements(named("domain.types.DomainEvent"))
            .field(FieldDescriptor::new("orderId", named("shop.OrderId")).public().final_())
            .field(FieldDescriptor::new("at", named("java.time.Instant")).public().final_()),
        TypeDescriptor::class("shop.PlaceOrder")
            .implements(generic("domain.types.DomainCommand", &["shop.Order"]))
            .field(FieldDescriptor::new("orderId", named("shop.OrderId"))),
        TypeDescriptor::interface("shop.Orders")
            .implements(generic(
                "domain.types.Repository",
                &["shop.OrderId", "shop.Order"],
            ))
            .method(
                MethodDescriptor::new("findById")
                    .param("id", named("shop.OrderId"))
                    .returns(generic("java.util.Optional", &["shop.Order"])),
            ),
        TypeDescriptor::class("shop.OrderSummary")
            .implements(named("domain.types.ReadModel"))
            .field(FieldDescriptor::new("orderId", named("shop.OrderId")))
            .field(FieldDescriptor::new("total", named("shop.Money"))),
        TypeDescriptor::interface("shop.OrderSummaries")
            .implements(generic("domain.types.QueryHandler", &["shop.OrderSummary"])),
        TypeDescriptor::class("shop.Checkout")
            .implements(named("domain.types.ApplicationService"))
            .method(
                MethodDescriptor::new("on")
                    .param("event", named("shop.OrderPlaced"))
                    .annotated(
                        Annotation::new("domain.annotations.ListensTo")
                            .with("domainEventType", "shop.OrderPlaced"),
                    ),
            ),
        TypeDescriptor::class("shop.Pricing").implements(named("domain.types.DomainService")),
        TypeDescriptor::interface("shop.Mailer").implements(named("domain.types.OutboundService")),
        TypeDescriptor::class("shop.Housekeeping").implements(named("domain.types.ServiceKind")),
    ]
}

pub fn catalog_with(extra: Vec<TypeDescriptor>) -> StaticCatalog {
    let mut types = marker_types();
    types.extend(shop_types());
    types.extend(extra);
    StaticCatalog::new(types, MarkerSet::default())
}

pub fn shop_catalog() -> StaticCatalog {
    catalog_with(Vec::new())
}

pub fn shop_config() -> MirrorConfig {
    MirrorConfig::with_roots(vec!["shop".to_string()])
}
